//! Paginated views
//!
//! A paginated view is what the explore controller hands to the UI: an
//! append-only collection that grows one page at a time.
//!
//! - [`Paginator`]: one paged source
//! - [`SequencedPagination`]: several paged sources read back to back as
//!   one gapless sequence (city matches first, then the rest of the state)
//! - [`EmptyView`]: placeholder before the first search

pub mod error;
pub mod paginator;
pub mod sequence;

pub use error::PaginationError;
pub use paginator::Paginator;
pub use sequence::SequencedPagination;

use crate::params::QueryParams;
use async_trait::async_trait;
use std::marker::PhantomData;

/// Contract between the controller and the listing UI
#[async_trait]
pub trait PaginatedView<T>: Send + Sync {
    /// Rows loaded so far, in display order
    fn collection(&self) -> Vec<&T>;

    /// Whether no further page can be requested
    fn is_last_page(&self) -> bool;

    /// Number of rows matching the query across every page
    fn total(&self) -> u64;

    /// Whether a page request is in flight
    fn is_loading(&self) -> bool;

    /// Start over with `params` and load the first page
    ///
    /// Returns how many rows became visible.
    async fn first_page(&mut self, params: QueryParams) -> Result<usize, PaginationError>;

    /// Load the next page
    ///
    /// Returns how many rows became visible; `0` once exhausted.
    async fn next_page(&mut self) -> Result<usize, PaginationError>;
}

/// View with no rows, used until a search has produced one
#[derive(Debug)]
pub struct EmptyView<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> EmptyView<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for EmptyView<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync> PaginatedView<T> for EmptyView<T> {
    fn collection(&self) -> Vec<&T> {
        Vec::new()
    }

    fn is_last_page(&self) -> bool {
        true
    }

    fn total(&self) -> u64 {
        0
    }

    fn is_loading(&self) -> bool {
        false
    }

    async fn first_page(&mut self, _params: QueryParams) -> Result<usize, PaginationError> {
        Ok(0)
    }

    async fn next_page(&mut self) -> Result<usize, PaginationError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_view() {
        let mut view: EmptyView<u32> = EmptyView::new();
        assert!(view.collection().is_empty());
        assert!(view.is_last_page());
        assert_eq!(view.total(), 0);
        assert_eq!(view.first_page(QueryParams::new()).await.unwrap(), 0);
        assert_eq!(view.next_page().await.unwrap(), 0);
    }
}
