//! Category lookup errors

use crate::source::SourceError;
use thiserror::Error;

/// Errors that can occur while loading or resolving categories
#[derive(Debug, Error)]
pub enum CategoryError {
    /// The cache finished loading and the id is not in it
    #[error("Category {0} not found")]
    NotFound(i64),

    /// The cache did not finish loading within the wait bound
    #[error("Timed out after {waited_ms}ms waiting for category {id}")]
    Timeout { id: i64, waited_ms: u64 },

    /// The wait was cancelled
    #[error("Category lookup cancelled")]
    Cancelled,

    /// The bulk load failed, so the id can never be resolved
    #[error("Categories unavailable: {0}")]
    Unavailable(String),

    /// Error from the category source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
