//! services/api/src/web/rest.rs
//!
//! Payloads shared by the REST handlers and the master definition for the
//! OpenAPI specification.

use life_lessons_core::{BatchReport, PortError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::error::ErrorBody;
use crate::web::{auth, categories, comments, lessons, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up_handler,
        auth::sign_in_handler,
        auth::sign_in_with_password_handler,
        users::list_users_handler,
        users::edit_profile_handler,
        users::delete_account_handler,
        lessons::list_lessons_handler,
        lessons::get_lesson_handler,
        lessons::create_lesson_handler,
        lessons::update_lesson_handler,
        lessons::delete_lesson_handler,
        lessons::like_lessons_handler,
        lessons::dislike_lessons_handler,
        comments::list_comments_handler,
        comments::create_comment_handler,
        comments::update_comment_handler,
        comments::delete_comment_handler,
        comments::batch_delete_comments_handler,
        categories::list_categories_handler,
        categories::get_category_handler,
        categories::create_category_handler,
        categories::update_category_handler,
        categories::delete_category_handler,
    ),
    components(
        schemas(
            ErrorBody,
            MessageResponse,
            BatchResponse,
            FailedItem,
            auth::SignUpRequest,
            auth::PasswordSignInRequest,
            auth::SessionResponse,
            users::ProfileResponse,
            users::EditProfileRequest,
            users::EditProfileResponse,
            lessons::LessonResponse,
            lessons::LessonRequest,
            lessons::LessonUpdateRequest,
            comments::CommentResponse,
            comments::NewCommentRequest,
            comments::CommentUpdateRequest,
            comments::BatchDeleteRequest,
            categories::CategoryResponse,
            categories::CategoryRequest,
            categories::CategoryUpdateRequest,
        )
    ),
    tags(
        (name = "Life Lessons API", description = "Accounts, personal life lessons, comments and categories.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// The body of a successful mutation that returns nothing else.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The `?id=` query used by single-item reads and deletes.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    pub id: String,
}

/// The per-item outcome of a batch mutation. A partial failure still
/// answers 200; the failed items are listed here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    pub message: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailedItem {
    pub id: String,
    pub reason: String,
}

impl BatchResponse {
    pub fn from_report<K: Display>(message: impl Into<String>, report: &BatchReport<K>) -> Self {
        Self {
            message: message.into(),
            succeeded: report.succeeded().map(|k| k.to_string()).collect(),
            failed: report
                .failed()
                .map(|(k, e)| FailedItem {
                    id: k.to_string(),
                    reason: failure_reason(e).to_string(),
                })
                .collect(),
        }
    }
}

/// Store internals stay in the logs; clients only learn the category.
fn failure_reason(error: &PortError) -> &'static str {
    match error {
        PortError::NotFound(_) => "not found",
        PortError::AlreadyExists(_) => "already exists",
        PortError::Unexpected(_) => "internal error",
    }
}
