//! services/api/src/web/comments.rs
//!
//! Comment endpoints. All of them require authentication; the batch delete
//! additionally requires an admin.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, Utc};
use life_lessons_core::Comment;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::UserId;
use crate::web::rest::{BatchResponse, IdQuery, MessageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub pll_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub comment: String,
    pub commented_on: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            pll_id: comment.lesson_id,
            user_id: comment.owner_id,
            username: comment.username,
            comment: comment.text,
            commented_on: comment.commented_on,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    pub pll_id: String,
    pub comment: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CommentUpdateRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    pub comment_ids: Vec<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /v1/comment/list - Fetch comments by id
///
/// Ids that are malformed or unknown are skipped rather than reported.
#[utoipa::path(
    post,
    path = "/v1/comment/list",
    request_body = [String],
    responses(
        (status = 200, description = "The comments that exist, in request order", body = [CommentResponse]),
        (status = 400, description = "Body is not a list of ids", body = ErrorBody)
    )
)]
pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let Json(comment_ids) = payload?;
    let comments = state.content.get_comments(comment_ids).await;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// POST /v1/comment/ - Comment on a lesson
#[utoipa::path(
    post,
    path = "/v1/comment/",
    request_body = NewCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 404, description = "No such lesson", body = ErrorBody)
    )
)]
pub async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<NewCommentRequest>, JsonRejection>,
) -> Result<Json<CommentResponse>, ApiError> {
    let Json(req) = payload?;
    let comment = state
        .content
        .create_comment(account_id, &req.pll_id, req.comment)
        .await?;
    Ok(Json(comment.into()))
}

/// PATCH /v1/comment/ - Edit one of the caller's comments
#[utoipa::path(
    patch,
    path = "/v1/comment/",
    request_body = CommentUpdateRequest,
    responses(
        (status = 200, description = "Comment updated", body = MessageResponse),
        (status = 403, description = "Not the owner, or no such comment", body = ErrorBody)
    )
)]
pub async fn update_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<CommentUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    state
        .content
        .update_comment(account_id, &req.id, &req.comment)
        .await?;
    Ok(Json(MessageResponse::new("Successfully updated comment")))
}

/// DELETE /v1/comment/?id= - Delete one of the caller's comments
#[utoipa::path(
    delete,
    path = "/v1/comment/",
    params(IdQuery),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 403, description = "Not the owner, or no such comment", body = ErrorBody)
    )
)]
pub async fn delete_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(query) = query?;
    state.content.delete_comment(account_id, &query.id).await?;
    Ok(Json(MessageResponse::new("Successfully deleted comment")))
}

/// POST /v1/comment/batchDelete - Delete many comments (admin only)
#[utoipa::path(
    post,
    path = "/v1/comment/batchDelete",
    request_body = BatchDeleteRequest,
    responses(
        (status = 200, description = "Per-comment outcome", body = BatchResponse),
        (status = 401, description = "Not authenticated as an admin", body = ErrorBody)
    )
)]
pub async fn batch_delete_comments_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(req) = payload?;
    let report = state.content.delete_comments(req.comment_ids).await;
    Ok(Json(BatchResponse::from_report("Deleted comments", &report)))
}
