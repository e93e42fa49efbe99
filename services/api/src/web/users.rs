//! services/api/src/web/users.rs
//!
//! Account endpoints behind authentication: the admin listing, profile edits
//! and self-deletion.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use life_lessons_core::{Account, ProfileUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::UserId;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The public view of an account. Credentials never appear here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub joined_on: DateTime<Utc>,
    pub is_admin: bool,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            photo: account.photo,
            joined_on: account.joined_on,
            is_admin: account.is_admin,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct EditProfileRequest {
    pub username: String,
    #[serde(default)]
    pub photo: Option<String>,
    /// Setting a new password signs every other session out.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EditProfileResponse {
    pub message: String,
    /// The replacement token, present only when the password changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /v1/user/ - List every account (admin only)
#[utoipa::path(
    get,
    path = "/v1/user/",
    responses(
        (status = 200, description = "All accounts", body = [ProfileResponse]),
        (status = 401, description = "Not authenticated as an admin", body = ErrorBody)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let accounts = state.authenticator.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(ProfileResponse::from).collect()))
}

/// PATCH /v1/user/edit - Update the caller's own profile
#[utoipa::path(
    patch,
    path = "/v1/user/edit",
    request_body = EditProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = EditProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn edit_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<EditProfileRequest>, JsonRejection>,
) -> Result<Json<EditProfileResponse>, ApiError> {
    let Json(req) = payload?;

    let token = state
        .authenticator
        .update_profile(
            account_id,
            ProfileUpdate {
                username: req.username,
                photo: req.photo,
                new_password: req.password.filter(|p| !p.is_empty()),
            },
        )
        .await?;

    Ok(Json(EditProfileResponse {
        message: "Successfully updated profile".to_string(),
        token,
    }))
}

/// DELETE /v1/user/ - Delete the caller's account with its lessons and comments
#[utoipa::path(
    delete,
    path = "/v1/user/",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
) -> Result<Json<MessageResponse>, ApiError> {
    // 1. Remove the account, which invalidates its token at once
    state.authenticator.delete_account(account_id).await?;

    // 2. Remove what it owned
    let removed = state.content.delete_owned_content(account_id).await?;
    info!(
        account_id = %account_id,
        lessons = removed.lessons,
        comments = removed.comments_removed(),
        "Account and owned content removed"
    );

    Ok(Json(MessageResponse::new("Successfully deleted account")))
}
