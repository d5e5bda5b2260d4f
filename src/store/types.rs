//! Core data types for the racing telemetry dataset
//!
//! Every record is scoped by `(race_id, session)`. All of these are read-only
//! from the service's point of view; an external ingester creates them.
//!
//! - `Race`: reference data for one race event
//! - `Driver`: a driver code present in a session
//! - `LapRecord`: one lap with its tire compound
//! - `TelemetrySample`: one car telemetry sample within a lap
//! - `DriverSummary`: aggregate lap statistics for one driver

use serde::{Deserialize, Serialize};

/// A race event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Race {
    /// Stable key scoping every other entity
    pub race_id: String,
    pub name: String,
    pub circuit: String,
    /// Opaque date string, used only for ordering
    pub date: String,
}

/// A driver as seen in a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Driver {
    /// Short identifier, e.g. "VER" or "1". Case-sensitive.
    pub code: String,
    /// Display name, when the dataset carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Driver {
    /// Create a driver known only by its code
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
        }
    }
}

/// A single lap joined with its tire compound
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LapRecord {
    pub race_id: String,
    pub driver: String,
    pub session: String,
    pub lap_number: i64,
    /// Lap time in seconds. Zero or negative marks an incomplete lap.
    pub lap_time_seconds: f64,
    /// Tire compound, empty when the tire table has no row for this lap
    pub compound: String,
}

/// One telemetry sample within a lap
///
/// Units are those of the source data and are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    pub race_id: String,
    pub driver: String,
    pub session: String,
    pub lap_number: i64,
    /// Offset from the start of the lap, increasing within a lap
    pub timestamp_seconds: f64,
    pub speed: f64,
    pub rpm: f64,
    pub gear: i64,
    pub throttle: f64,
}

/// Aggregate lap statistics for one driver in one race session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverSummary {
    pub race_id: String,
    pub driver: String,
    pub session: String,
    pub average_lap_time: f64,
    pub fastest_lap_time: f64,
    pub laps_completed: i64,
}
