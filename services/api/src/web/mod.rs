//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handlers grouped by resource, the auth middleware, and
//! the router that ties them together.

pub mod auth;
pub mod categories;
pub mod comments;
pub mod lessons;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

pub use middleware::{require_admin, require_auth, UserId};

/// Builds the complete application router, Swagger UI included.
pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state.config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/v1/user/signUp", post(auth::sign_up_handler))
        .route("/v1/user/signIn", post(auth::sign_in_handler))
        .route(
            "/v1/user/signInWithPassword",
            post(auth::sign_in_with_password_handler),
        );

    // Protected routes (any signed-in account)
    let protected_routes = Router::new()
        .route("/v1/user/edit", patch(users::edit_profile_handler))
        .route("/v1/user/", delete(users::delete_account_handler))
        .route("/v1/pll/plls", get(lessons::list_lessons_handler))
        .route("/v1/pll/pll", get(lessons::get_lesson_handler))
        .route(
            "/v1/pll/",
            post(lessons::create_lesson_handler)
                .patch(lessons::update_lesson_handler)
                .delete(lessons::delete_lesson_handler),
        )
        .route("/v1/pll/like", post(lessons::like_lessons_handler))
        .route("/v1/pll/dislike", post(lessons::dislike_lessons_handler))
        .route("/v1/comment/list", post(comments::list_comments_handler))
        .route(
            "/v1/comment/",
            post(comments::create_comment_handler)
                .patch(comments::update_comment_handler)
                .delete(comments::delete_comment_handler),
        )
        .route(
            "/v1/category/categories",
            get(categories::list_categories_handler),
        )
        .route("/v1/category/category", get(categories::get_category_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes (signed-in account with the admin flag)
    let admin_routes = Router::new()
        .route("/v1/user/", get(users::list_users_handler))
        .route(
            "/v1/comment/batchDelete",
            post(comments::batch_delete_comments_handler),
        )
        .route(
            "/v1/category/",
            post(categories::create_category_handler)
                .patch(categories::update_category_handler)
                .delete(categories::delete_category_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    let store_timeout = state.config.store_timeout;

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, store_timeout))
        .layer(axum_middleware::map_response(envelope_timeouts))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}

/// The timeout layer answers with an empty body; give it the usual envelope.
async fn envelope_timeouts(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::Timeout.into_response();
    }
    response
}
