//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: sign-up and the two sign-in paths.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    Json,
};
use life_lessons_core::{bearer_token, IssuedSession, SignUp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordSignInRequest {
    pub email: String,
    pub password: String,
}

/// A freshly issued session. Any earlier token of the account is now stale.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user_id: Uuid,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            token: session.token,
            user_id: session.account_id,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /v1/user/signUp - Create a new account and sign it in
#[utoipa::path(
    post,
    path = "/v1/user/signUp",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn sign_up_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = payload?;

    let session = state
        .authenticator
        .sign_up(SignUp {
            username: req.username,
            email: req.email,
            password: req.password,
            photo: req.photo,
        })
        .await?;

    Ok(Json(session.into()))
}

/// POST /v1/user/signIn - Exchange the current token for a new one
#[utoipa::path(
    post,
    path = "/v1/user/signIn",
    responses(
        (status = 200, description = "Token rotated", body = SessionResponse),
        (status = 401, description = "Token missing, invalid, expired or stale", body = ErrorBody)
    ),
    params(
        ("Authorization" = String, Header, description = "`Bearer <token>`, the latest token of the account.")
    )
)]
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(authorization)?;

    let session = state.authenticator.sign_in_with_token(token).await?;
    Ok(Json(session.into()))
}

/// POST /v1/user/signInWithPassword - Sign in with email and password
#[utoipa::path(
    post,
    path = "/v1/user/signInWithPassword",
    request_body = PasswordSignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody)
    )
)]
pub async fn sign_in_with_password_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PasswordSignInRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = payload?;

    let session = state
        .authenticator
        .sign_in_with_password(&req.email, &req.password)
        .await?;
    Ok(Json(session.into()))
}
