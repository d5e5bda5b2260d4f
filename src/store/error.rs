//! Store error types
//!
//! Defines all errors that can occur while talking to the data store.

use thiserror::Error;

/// Errors that can occur in the store layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Opening a database connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Preparing or executing a statement failed
    #[error("Query error: {0}")]
    Query(String),

    /// A row could not be converted into the expected record type
    #[error("Row scan error: {0}")]
    Scan(String),

    /// The query did not finish within the configured timeout
    #[error("Query timed out after {0} ms")]
    Timeout(u64),

    /// The blocking worker running the query panicked or was cancelled
    #[error("Worker error: {0}")]
    Worker(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::FromSqlConversionFailure(..) => StoreError::Scan(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Worker(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
