//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the HTTP API.
//!
//! Usage: `openapi [PATH]`. `PATH` defaults to `openapi.json`; `-` prints the
//! document to stdout instead.

use api_lib::error::ApiError;
use api_lib::web::rest::ApiDoc;
use std::io::Write;
use utoipa::OpenApi;

const DEFAULT_PATH: &str = "openapi.json";

fn main() -> Result<(), ApiError> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PATH.to_string());

    let doc = ApiDoc::openapi();
    let routes = doc.paths.paths.len();
    let json = doc
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("could not serialize OpenAPI document: {e}")))?;

    if target == "-" {
        std::io::stdout().write_all(json.as_bytes())?;
        return Ok(());
    }

    std::fs::write(&target, json)?;
    eprintln!("Wrote {routes} documented paths to {target}");
    Ok(())
}
