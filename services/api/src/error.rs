//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use life_lessons_core::{AuthError, ContentError, PortError, TokenError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A request failed the authentication flow.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A lesson, comment or category operation was refused or failed.
    #[error("{0}")]
    Content(#[from] ContentError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request did not finish within the configured store timeout.
    #[error("request timed out")]
    Timeout,

    /// The request itself was unusable (body shape, query parameters).
    #[error("{0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The body of every failure response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::NoToken
                | AuthError::AccountNotFound
                | AuthError::StaleToken
                | AuthError::CredentialMismatch
                | AuthError::NotAdmin => StatusCode::UNAUTHORIZED,
                AuthError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Token(_) => StatusCode::UNAUTHORIZED,
                AuthError::NotFound(_) => StatusCode::FORBIDDEN,
                AuthError::AlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::Hashing(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Content(e) => match e {
                ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                ContentError::InvalidId(_) | ContentError::UnknownCategory(_) => {
                    StatusCode::BAD_REQUEST
                }
                ContentError::NotAuthorized(_) => StatusCode::FORBIDDEN,
                ContentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Port(e) => match e {
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::AlreadyExists(_) => StatusCode::CONFLICT,
                PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures are logged in full and answered generically.
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use life_lessons_core::ResourceKind;

    #[test]
    fn authentication_failures_are_unauthorized() {
        for e in [
            AuthError::NoToken,
            AuthError::Token(TokenError::Expired),
            AuthError::Token(TokenError::InvalidSignature),
            AuthError::StaleToken,
            AuthError::CredentialMismatch,
            AuthError::NotAdmin,
        ] {
            assert_eq!(ApiError::from(e).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn ownership_failures_are_forbidden() {
        let e = ApiError::from(ContentError::NotAuthorized(ResourceKind::Comment));
        assert_eq!(e.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn duplicate_sign_up_is_a_conflict() {
        let e = ApiError::from(AuthError::AlreadyExists("a@x.com".into()));
        assert_eq!(e.status(), StatusCode::CONFLICT);
    }
}
