//! Store error types.

use thiserror::Error;

/// Errors that can occur in a repository backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed (connection, I/O, constraint violation).
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
