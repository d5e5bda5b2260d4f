//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::query::QueryService;
use crate::store::TelemetryStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Query service over the telemetry store
    pub service: Arc<QueryService>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: QueryService, config: ApiConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Create AppState directly from a store
    pub fn from_store(store: Arc<dyn TelemetryStore>, config: ApiConfig) -> Self {
        Self::new(QueryService::new(store), config)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
