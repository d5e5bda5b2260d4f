//! Query error types
//!
//! Defines all error conditions that can occur while validating a request and
//! running it against the store.

use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// A required parameter was absent or empty after trimming
    #[error("{0} is required")]
    MissingParam(&'static str),

    /// A parameter was present but could not be parsed
    #[error("{name} {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String,
    },

    /// Store layer error
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

impl QueryError {
    /// True for failures caused by the request rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::MissingParam(_) | QueryError::InvalidParam { .. }
        )
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
