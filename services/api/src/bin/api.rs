//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{Argon2Hasher, JwtTokenService, MemoryStore, PgStore},
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use life_lessons_core::ports::{ContentStore, CredentialStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store & Run Migrations ---
    let (accounts, content): (Arc<dyn CredentialStore>, Arc<dyn ContentStore>) =
        match &config.database_url {
            Some(database_url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(config.store_timeout)
                    .connect(database_url)
                    .await?;
                let store = Arc::new(PgStore::new(db_pool));
                info!("Running database migrations...");
                store.run_migrations().await?;
                info!("Database migrations complete.");
                (store.clone(), store)
            }
            None => {
                warn!("DATABASE_URL is not set; using the in-memory store. Nothing will persist.");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    // --- 3. Initialize Credential Adapters ---
    let hasher = Arc::new(
        Argon2Hasher::new(config.password_hash_cost, config.password_hash_memory_kib)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    let tokens = Arc::new(JwtTokenService::new(&config.jwt_secret, config.token_ttl));
    if config.admin_emails.is_empty() {
        warn!("ADMIN_EMAILS is empty; no account will be granted admin at sign-up.");
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        accounts,
        content,
        tokens,
        hasher,
    ));

    // --- 5. Create the Web Router ---
    let app = router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
