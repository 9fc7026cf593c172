//! Unified error handling for the sync job.
//!
//! Every step of a run returns `SyncResult`, so the runner can use `?`
//! naturally and still tell a skippable condition (missing credentials)
//! apart from one that should fail the user or the run.

use thiserror::Error;

/// Unified error type for a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Database connection pool error
    #[error("Database connection error")]
    ConnectionPool(#[source] diesel_async::pooled_connection::deadpool::PoolError),

    /// Database query error
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// A row the user needs (refresh token, webhook target) is missing
    #[error("{0} not found")]
    NotFound(String),

    /// Calendar API, OAuth or network failure
    #[error("Calendar API error: {0}")]
    Calendar(String),

    /// The fetch window could not be placed on the local clock
    #[error("Invalid event window: {0}")]
    InvalidWindow(String),
}

impl SyncError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        SyncError::NotFound(resource.into())
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        SyncError::Calendar(message.into())
    }

    /// Missing data for one user; the runner skips that user instead of failing.
    pub fn is_skippable(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for SyncError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        SyncError::ConnectionPool(err)
    }
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
