//! Data Transfer Objects
//!
//! Response types that are not dataset records. Dataset endpoints serialize
//! the store types and per-driver maps directly.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// "ok" or "error"
    pub database: String,
    pub uptime_seconds: u64,
    pub version: String,
}
