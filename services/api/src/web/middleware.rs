//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use life_lessons_core::bearer_token;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The authenticated account, placed in the request extensions by the
/// middleware. Handlers behind it can rely on its presence.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

fn authorization_header(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Middleware that validates the bearer token and extracts the account id.
///
/// If valid, inserts a `UserId` into request extensions for handlers to use.
/// Otherwise the request ends here with a 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the token from the Authorization header
    let token = bearer_token(authorization_header(&req))?.to_owned();

    // 2. Run the full validation flow against the store
    let account = state.authenticator.authenticate(&token).await?;

    // 3. Insert the account id into request extensions
    req.extensions_mut().insert(UserId(account.account_id));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Like `require_auth`, but the account must also be an admin both in the
/// token and in the store.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(authorization_header(&req))?.to_owned();
    let account = state.authenticator.authenticate_admin(&token).await?;

    req.extensions_mut().insert(UserId(account.account_id));
    Ok(next.run(req).await)
}
