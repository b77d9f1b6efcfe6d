//! Data-source error types
//!
//! Errors raised by the catalog, category and city sources. The explore
//! flow treats every variant as scoped to a single request: nothing here is
//! fatal to the process.

use thiserror::Error;

/// Errors that can occur while fetching from a data source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing service could not be reached or refused the request
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The request reached the service but failed
    #[error("Request failed: {0}")]
    Request(String),

    /// A parameter could not be interpreted
    #[error("Invalid parameter '{key}': {value}")]
    InvalidParameter { key: String, value: String },

    /// A row could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// I/O error while reading a data file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
