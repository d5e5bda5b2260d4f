//! Pitwall API Server
//!
//! Run with: cargo run --bin pitwall
//!
//! # Configuration
//!
//! Read from `PITWALL_CONFIG`, a default config location, or defaults.
//! Environment variables override the file:
//! - `PORT` / `PITWALL_PORT`: Port to listen on (default: 8080)
//! - `PITWALL_HOST`: Host to bind to (default: 0.0.0.0)
//! - `PITWALL_DB_PATH`: SQLite database file (default: racing_data.db)
//! - `PITWALL_DB_POOL_SIZE`: Pooled read-only connections (default: 4)
//! - `PITWALL_QUERY_TIMEOUT_MS`: Per-query timeout (default: 10000)
//! - `PITWALL_LOG_LEVEL` / `PITWALL_LOG_FORMAT`: Logging (default: info, pretty)
//! - `RUST_LOG`: Full filter override

use pitwall::api::{serve, AppState};
use pitwall::config::Config;
use pitwall::logging;
use pitwall::store::SqliteStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = logging::with_startup_logging(Config::load_default)?;

    logging::init(&config.logging);

    tracing::info!("Starting Pitwall API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.database.path);

    let store = SqliteStore::open(&config.database.sqlite())?;

    let state = AppState::from_store(Arc::new(store), config.api.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("Pitwall API server stopped");
    Ok(())
}
