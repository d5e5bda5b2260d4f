//! Pitwall Query Service
//!
//! Everything between an HTTP request and the store:
//!
//! - **params**: Extract and validate request parameters
//! - **sql**: Compose parameterized statements
//! - **service**: Run statements and shape rows into per-driver documents
//!
//! # Example
//!
//! ```rust,ignore
//! use pitwall::query::{QueryService, RequestParams};
//!
//! let service = QueryService::new(store);
//! let params = RequestParams::new()
//!     .race_id("2024_spa")
//!     .session("R")
//!     .drivers("VER,HAM");
//!
//! let laps = service.laps(&params).await?;
//! for (driver, laps) in &laps {
//!     println!("{}: {} laps", driver, laps.len());
//! }
//! ```

mod error;
pub mod params;
pub mod service;
pub mod sql;

pub use error::{QueryError, QueryResult};
pub use params::{DriverSelection, LapSelection, RequestParams, SessionScope};
pub use service::{LapsByDriver, QueryService, SummaryByDriver, TelemetryByDriver};
