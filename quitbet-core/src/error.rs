//! Error types for storage and engine operations

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No profile exists yet. Expected for first-time users; callers treat
    /// this as "create one", not as a failure.
    #[error("Profile not found")]
    NotFound,

    /// The backing store is unreachable or timed out. Reads fall back to the
    /// local snapshot; writes surface this to the caller.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Attempted to create a profile where one already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A profile patch violates an invariant. Rejected before any adapter
    /// call is issued.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}
