//! Shared fixtures for the integration tests: the real credential adapters
//! with cheap parameters, over the in-memory store.

#![allow(dead_code)]

use api_lib::adapters::{Argon2Hasher, JwtTokenService, MemoryStore};
use api_lib::config::{Config, SigningSecret};
use api_lib::web::{router, state::AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use life_lessons_core::{IssuedSession, NewCategory, SignUp};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@lessons.test";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub tokens: JwtTokenService,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: None,
        log_level: tracing::Level::INFO,
        jwt_secret: SigningSecret::new(SECRET),
        token_ttl: chrono::Duration::hours(24),
        password_hash_cost: 1,
        password_hash_memory_kib: 8,
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        store_timeout: Duration::from_secs(5),
        cors_origin: "http://localhost:3000".to_string(),
    }
}

pub fn test_app() -> TestApp {
    let config = Arc::new(test_config());
    let store = MemoryStore::new();
    let tokens = JwtTokenService::new(&config.jwt_secret, config.token_ttl);
    let hasher =
        Argon2Hasher::new(config.password_hash_cost, config.password_hash_memory_kib).unwrap();

    let state = Arc::new(AppState::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(tokens.clone()),
        Arc::new(hasher),
    ));

    TestApp {
        state,
        store,
        tokens,
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        router(self.state.clone()).unwrap()
    }

    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> IssuedSession {
        self.state
            .authenticator
            .sign_up(SignUp {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                photo: None,
            })
            .await
            .unwrap()
    }

    /// Creates a category straight through the content service.
    pub async fn category(&self, title: &str) -> String {
        self.state
            .content
            .create_category(NewCategory {
                title: title.to_string(),
                description: format!("All about {title}"),
            })
            .await
            .unwrap()
            .id
            .to_string()
    }
}

/// Sends one request through the router and returns the status and the
/// decoded JSON body (`Value::Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
