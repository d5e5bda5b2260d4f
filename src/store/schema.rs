//! Table definitions for the telemetry dataset
//!
//! The service only ever reads these tables. `create_tables` exists so a fresh
//! database file can be provisioned for an external ingester, and so tests can
//! build fixtures.

use rusqlite::Connection;

use super::StoreResult;

/// DDL for the four dataset tables
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS races (
    race_id TEXT NOT NULL,
    name TEXT NOT NULL,
    circuit TEXT NOT NULL,
    date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS telemetry (
    race_id TEXT,
    driver TEXT,
    session TEXT,
    lap_number INTEGER,
    timestamp_seconds DOUBLE,
    speed DOUBLE,
    rpm DOUBLE,
    gear INTEGER,
    throttle DOUBLE
);

CREATE TABLE IF NOT EXISTS lap_times (
    race_id TEXT,
    driver TEXT,
    session TEXT,
    lap_number INTEGER,
    lap_time_seconds DOUBLE
);

CREATE TABLE IF NOT EXISTS tires (
    race_id TEXT,
    driver TEXT,
    session TEXT,
    lap_number INTEGER,
    compound TEXT
);
"#;

/// Create the dataset tables if they don't exist
pub fn create_tables(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
