//! services/api/src/web/categories.rs
//!
//! Category endpoints. Reads need any signed-in account, mutations an admin.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use life_lessons_core::{Category, NewCategory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::{IdQuery, MessageResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            title: category.title,
            description: category.description,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CategoryUpdateRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
}

/// GET /v1/category/categories - List every category
#[utoipa::path(
    get,
    path = "/v1/category/categories",
    responses(
        (status = 200, description = "All categories by title", body = [CategoryResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.content.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// GET /v1/category/category?id= - Fetch one category
#[utoipa::path(
    get,
    path = "/v1/category/category",
    params(IdQuery),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 400, description = "Missing or malformed id", body = ErrorBody),
        (status = 404, description = "No such category", body = ErrorBody)
    )
)]
pub async fn get_category_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let Query(query) = query?;
    let category = state.content.get_category(&query.id).await?;
    Ok(Json(category.into()))
}

/// POST /v1/category/ - Create a category (admin only)
#[utoipa::path(
    post,
    path = "/v1/category/",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CategoryResponse),
        (status = 401, description = "Not authenticated as an admin", body = ErrorBody)
    )
)]
pub async fn create_category_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let Json(req) = payload?;
    let category = state
        .content
        .create_category(NewCategory {
            title: req.title,
            description: req.description,
        })
        .await?;
    Ok(Json(category.into()))
}

/// PATCH /v1/category/ - Rename or redescribe a category (admin only)
#[utoipa::path(
    patch,
    path = "/v1/category/",
    request_body = CategoryUpdateRequest,
    responses(
        (status = 200, description = "Category updated", body = MessageResponse),
        (status = 404, description = "No such category", body = ErrorBody)
    )
)]
pub async fn update_category_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CategoryUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    state
        .content
        .update_category(&req.id, req.title, req.description)
        .await?;
    Ok(Json(MessageResponse::new("Successfully updated category")))
}

/// DELETE /v1/category/?id= - Delete a category (admin only)
#[utoipa::path(
    delete,
    path = "/v1/category/",
    params(IdQuery),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "No such category", body = ErrorBody)
    )
)]
pub async fn delete_category_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(query) = query?;
    state.content.delete_category(&query.id).await?;
    Ok(Json(MessageResponse::new("Successfully deleted category")))
}
