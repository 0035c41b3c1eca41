//! # SubTrack API Server
//!
//! Main entry point for the SubTrack subscription management API.
//!
//! ## Startup sequence
//!
//! 1. Initialize tracing from `RUST_LOG`
//! 2. Load configuration from the environment (and `.env` in development)
//! 3. Create the PostgreSQL pool and run pending migrations
//! 4. Build the router and serve until Ctrl+C
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p subtrack-api
//! ```

use std::sync::Arc;

use subtrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use subtrack_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
};
use subtrack_shared::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subtrack_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SubTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database pool and apply pending migrations
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // Build application state and router
    let store = Arc::new(PgStore::new(pool.clone()));
    let bind_address = config.bind_address();
    let state = AppState::new(pool, config, store);
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when Ctrl+C is received
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
