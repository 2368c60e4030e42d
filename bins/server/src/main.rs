//! Lavo API Server
//!
//! Main entry point for the cash register backend service.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lavo_api::{AppState, create_router};
use lavo_db::connect_with;
use lavo_shared::{AppConfig, AppError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lavo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().map_err(AppError::from)?;

    // Connect to database
    let db = connect_with(&config.database)
        .await
        .map_err(|e| AppError::Internal(format!("database connection failed: {e}")))?;
    info!(
        max_connections = config.database.max_connections,
        min_connections = config.database.min_connections,
        "Connected to database"
    );

    // Create router
    let app = create_router(AppState::new(db));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
