//! Pagination errors

use crate::source::SourceError;
use thiserror::Error;

/// Errors raised while loading pages
#[derive(Debug, Error)]
pub enum PaginationError {
    /// The page request failed
    #[error("Page load failed: {0}")]
    Source(#[from] SourceError),

    /// `next_page` was called before `first_page`
    #[error("No page has been requested yet")]
    NotStarted,

    /// One source of a sequenced view failed; rows already loaded are kept
    #[error("Source #{index} of the sequence failed: {error}")]
    Sequence {
        index: usize,
        #[source]
        error: Box<PaginationError>,
    },
}

impl PaginationError {
    /// Wrap an error from the source at `index` of a sequence
    #[must_use]
    pub fn in_sequence(index: usize, error: Self) -> Self {
        Self::Sequence {
            index,
            error: Box::new(error),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
