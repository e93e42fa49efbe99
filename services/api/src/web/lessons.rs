//! services/api/src/web/lessons.rs
//!
//! Personal life lesson endpoints. Every route here sits behind `require_auth`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, Utc};
use life_lessons_core::{Lesson, LessonDraft};
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
pub struct LessonResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub category_id: Uuid,
    pub title: String,
    pub learning: String,
    pub related_story: String,
    pub created_on: DateTime<Utc>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Uuid>,
}

impl From<Lesson> for LessonResponse {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            user_id: lesson.owner_id,
            username: lesson.username,
            category_id: lesson.category_id,
            title: lesson.title,
            learning: lesson.learning,
            related_story: lesson.related_story,
            created_on: lesson.created_on,
            likes: lesson.likes,
            comments: lesson.comments,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub category_id: String,
    pub title: String,
    pub learning: String,
    pub related_story: String,
}

impl From<LessonRequest> for LessonDraft {
    fn from(req: LessonRequest) -> Self {
        Self {
            category_id: req.category_id,
            title: req.title,
            learning: req.learning,
            related_story: req.related_story,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonUpdateRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub learning: String,
    pub related_story: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /v1/pll/plls - List every lesson
#[utoipa::path(
    get,
    path = "/v1/pll/plls",
    responses(
        (status = 200, description = "All lessons, oldest first", body = [LessonResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn list_lessons_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let lessons = state.content.list_lessons().await?;
    Ok(Json(lessons.into_iter().map(LessonResponse::from).collect()))
}

/// GET /v1/pll/pll?id= - Fetch one lesson
#[utoipa::path(
    get,
    path = "/v1/pll/pll",
    params(IdQuery),
    responses(
        (status = 200, description = "The lesson", body = LessonResponse),
        (status = 400, description = "Missing or malformed id", body = ErrorBody),
        (status = 404, description = "No such lesson", body = ErrorBody)
    )
)]
pub async fn get_lesson_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Query(query) = query?;
    let lesson = state.content.get_lesson(&query.id).await?;
    Ok(Json(lesson.into()))
}

/// POST /v1/pll/ - Create a lesson owned by the caller
#[utoipa::path(
    post,
    path = "/v1/pll/",
    request_body = LessonRequest,
    responses(
        (status = 200, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Invalid request or unknown category", body = ErrorBody)
    )
)]
pub async fn create_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Json(req) = payload?;
    let lesson = state.content.create_lesson(account_id, req.into()).await?;
    Ok(Json(lesson.into()))
}

/// PATCH /v1/pll/ - Edit one of the caller's lessons
#[utoipa::path(
    patch,
    path = "/v1/pll/",
    request_body = LessonUpdateRequest,
    responses(
        (status = 200, description = "Lesson updated", body = MessageResponse),
        (status = 400, description = "Invalid request or unknown category", body = ErrorBody),
        (status = 403, description = "Not the owner, or no such lesson", body = ErrorBody)
    )
)]
pub async fn update_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<LessonUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let draft = LessonDraft {
        category_id: req.category_id,
        title: req.title,
        learning: req.learning,
        related_story: req.related_story,
    };

    state.content.update_lesson(account_id, &req.id, draft).await?;
    Ok(Json(MessageResponse::new("Successfully updated lesson")))
}

/// DELETE /v1/pll/?id= - Delete one of the caller's lessons with its comments
#[utoipa::path(
    delete,
    path = "/v1/pll/",
    params(IdQuery),
    responses(
        (status = 200, description = "Lesson deleted; lists the comments removed with it", body = BatchResponse),
        (status = 403, description = "Not the owner, or no such lesson", body = ErrorBody)
    )
)]
pub async fn delete_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Query(query) = query?;
    let comments = state.content.delete_lesson(account_id, &query.id).await?;
    Ok(Json(BatchResponse::from_report(
        "Successfully deleted lesson",
        &comments,
    )))
}

/// POST /v1/pll/like - Like every lesson in the list
#[utoipa::path(
    post,
    path = "/v1/pll/like",
    request_body = [String],
    responses(
        (status = 200, description = "Per-lesson outcome", body = BatchResponse),
        (status = 400, description = "Body is not a list of ids", body = ErrorBody)
    )
)]
pub async fn like_lessons_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(lesson_ids) = payload?;
    let report = state.content.like_lessons(account_id, lesson_ids).await;
    Ok(Json(BatchResponse::from_report("Liked lessons", &report)))
}

/// POST /v1/pll/dislike - Withdraw the caller's like from every lesson in the list
#[utoipa::path(
    post,
    path = "/v1/pll/dislike",
    request_body = [String],
    responses(
        (status = 200, description = "Per-lesson outcome", body = BatchResponse),
        (status = 400, description = "Body is not a list of ids", body = ErrorBody)
    )
)]
pub async fn dislike_lessons_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(account_id)): Extension<UserId>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(lesson_ids) = payload?;
    let report = state.content.dislike_lessons(account_id, lesson_ids).await;
    Ok(Json(BatchResponse::from_report("Disliked lessons", &report)))
}
