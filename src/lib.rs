//! # Pitwall
//!
//! A read-only HTTP API over a racing telemetry dataset: races, the drivers in
//! a session, lap times with tire compounds, raw car telemetry for a lap and
//! per-driver lap statistics.
//!
//! ## Modules
//!
//! - [`store`]: Record types and the SQL store behind the API
//! - [`query`]: Parameter validation, SQL composition and result shaping
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pitwall::query::{QueryService, RequestParams};
//! use pitwall::store::{SqliteConfig, SqliteStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open(&SqliteConfig::new("racing_data.db"))?;
//!     let service = QueryService::new(Arc::new(store));
//!
//!     let params = RequestParams::new()
//!         .race_id("2024_spa")
//!         .session("R")
//!         .drivers("VER,HAM");
//!
//!     for (driver, summary) in service.summary(&params).await? {
//!         println!("{}: fastest {:.3}s", driver, summary.fastest_lap_time);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod query;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    Driver, DriverSummary, LapRecord, Race, SqliteConfig, SqliteStore, Statement, StoreError,
    StoreResult, TelemetrySample, TelemetryStore,
};

pub use query::{
    LapsByDriver, QueryError, QueryResult, QueryService, RequestParams, SummaryByDriver,
    TelemetryByDriver,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Config, ConfigError, DatabaseConfig, LoggingConfig};
