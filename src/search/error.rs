//! Explore controller errors
//!
//! # Error Types
//!
//! - **`BuildError`**: the builder was missing a required service
//! - **`Pagination`**: the listing could not produce a page
//! - **`Source`**: a direct source call (city directory) failed
//! - **`Category`**: a category id could not be resolved

use crate::categories::CategoryError;
use crate::pagination::PaginationError;
use crate::source::SourceError;
use thiserror::Error;

/// Errors surfaced by [`ProjectsExplorer`](super::ProjectsExplorer)
#[derive(Debug, Error)]
pub enum SearchError {
    /// Failed to assemble the controller
    #[error("Failed to build explorer: {0}")]
    BuildError(String),

    #[error("Listing error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Category error: {0}")]
    Category(#[from] CategoryError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
