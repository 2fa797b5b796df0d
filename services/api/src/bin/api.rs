//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{Argon2Hasher, DbAdapter, FileMailer},
    config::Config,
    error::ApiError,
    web::{
        router,
        state::{Adapters, AppState},
    },
};
use notekeeper_core::memory::InMemoryStore;
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

    // --- 2. Connect to Database & Run Migrations ---
    let hasher = Arc::new(Argon2Hasher::new());
    let mailer = Arc::new(FileMailer::new(config.email_dir.clone()));
    let adapters = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Adapters {
                users: db_adapter.clone(),
                notes: db_adapter.clone(),
                sessions: db_adapter,
                hasher,
                mailer,
            }
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
            let store = Arc::new(InMemoryStore::new());
            Adapters {
                users: store.clone(),
                notes: store.clone(),
                sessions: store,
                hasher,
                mailer,
            }
        }
    };
    info!(outbox = %config.email_dir.display(), "Confirmation emails are written to disk");

    // --- 3. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(config.clone(), adapters));
    let app = router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
