//! Stampcard Service - HTTP API for the café loyalty ledger
//!
//! This is the main entry point for the stampcard service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stampcard_service::{create_router, AppState, ServiceConfig};
use stampcard_store::{SqliteStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stampcard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stampcard Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_url = %config.database_url,
        stamps_needed = config.loyalty_defaults.stamps_needed,
        cents_per_stamp = config.loyalty_defaults.cents_per_stamp,
        "Service configuration loaded"
    );

    // Open the SQLite store and seed program rules on first run
    tracing::info!(url = %config.database_url, "Opening SQLite store");
    let store = SqliteStore::connect(&config.database_url, config.db_max_connections).await?;
    store.seed_config(&config.loyalty_defaults).await?;
    let store = Arc::new(store);

    // Build app state
    let state = AppState::new(Arc::clone(&store), config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    store.close().await;

    Ok(())
}
