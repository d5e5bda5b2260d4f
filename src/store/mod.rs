//! Pitwall Data Store
//!
//! This module is the boundary to the SQL database holding the dataset:
//!
//! - **types**: Record types (Race, LapRecord, TelemetrySample, ...)
//! - **error**: Error types
//! - **schema**: Table definitions
//! - **sqlite**: Pooled SQLite implementation of [`TelemetryStore`]
//!
//! # Architecture
//!
//! ```text
//! Read Path:
//!   QueryService → Statement (sql + params) → TelemetryStore → rows → records
//! ```
//!
//! The store never composes SQL itself. It receives a [`Statement`] whose
//! values are bound positionally, scans every row into a record and returns
//! either all of them or an error.

pub mod error;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use sqlite::{SqliteConfig, SqliteStore};
pub use types::{Driver, DriverSummary, LapRecord, Race, TelemetrySample};

use async_trait::async_trait;
use rusqlite::types::{ToSql, ToSqlOutput};

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Text(s) => s.to_sql(),
            SqlValue::Integer(i) => i.to_sql(),
        }
    }
}

/// A parameterized SELECT: query text plus values in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Create a statement with no bound values
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Number of `?` placeholders in the query text
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Read-only access to the telemetry dataset
///
/// Each method executes one statement and scans every resulting row. A scan
/// failure on any row fails the whole call; partial results are never
/// returned.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Rows of `race_id, name, circuit, date`
    async fn races(&self, stmt: Statement) -> StoreResult<Vec<Race>>;

    /// Rows of a single `driver` column
    async fn drivers(&self, stmt: Statement) -> StoreResult<Vec<Driver>>;

    /// Rows of `race_id, driver, session, lap_number, lap_time_seconds, compound`
    async fn laps(&self, stmt: Statement) -> StoreResult<Vec<LapRecord>>;

    /// Rows of `race_id, driver, session, lap_number, timestamp_seconds, speed, rpm, gear, throttle`
    async fn telemetry(&self, stmt: Statement) -> StoreResult<Vec<TelemetrySample>>;

    /// Rows of `race_id, driver, session, average, fastest, count`
    async fn summaries(&self, stmt: Statement) -> StoreResult<Vec<DriverSummary>>;

    /// Cheap liveness check against the database
    async fn ping(&self) -> StoreResult<()>;
}
