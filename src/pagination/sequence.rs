//! Sequenced pagination
//!
//! Reads several independently paged sources as one sequence: every row of
//! source 0 in its own order, then every row of source 1, and so on. The
//! exposed collection grows by a fixed page size, and it only reaches into
//! a later source once every earlier source is exhausted, so rows already
//! shown never move.
//!
//! ```text
//!  source 0 (city)      ██████████████░░          ← fetched page by page
//!  source 1 (state)                     ████████  ← first page fetched up front
//!  visible              |── page ──|── page ──|
//! ```

use super::{PaginatedView, PaginationError, Paginator};
use crate::params::QueryParams;
use async_trait::async_trait;
use futures::future::join_all;

/// Gapless concatenation of paged sources
pub struct SequencedPagination<T> {
    sources: Vec<Paginator<T>>,
    page_size: usize,
    visible: usize,
    started: bool,
}

impl<T: Send + Sync + 'static> SequencedPagination<T> {
    /// Sequence `sources` in order, growing by `page_size` rows per page
    #[must_use]
    pub fn new(sources: Vec<Paginator<T>>, page_size: u32) -> Self {
        Self {
            sources,
            page_size: page_size.max(1) as usize,
            visible: 0,
            started: false,
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[Paginator<T>] {
        &self.sources
    }

    /// Rows that can be shown without a later fetch reordering them
    ///
    /// Counts every source up to and including the first one that still has
    /// pages to fetch.
    fn contiguous(&self) -> usize {
        let mut count = 0;
        for source in &self.sources {
            count += source.items().len();
            if !source.is_last_page() {
                break;
            }
        }
        count
    }

    fn buffered(&self) -> usize {
        self.sources.iter().map(|s| s.items().len()).sum()
    }

    /// Fetch from the earliest unexhausted source until `target` rows are contiguous
    async fn fill(&mut self, target: usize) -> Result<(), PaginationError> {
        while self.contiguous() < target {
            let Some(index) = self.sources.iter().position(|s| !s.is_last_page()) else {
                break;
            };
            let fetched = self.sources[index]
                .next_page()
                .await
                .map_err(|e| PaginationError::in_sequence(index, e))?;
            if fetched == 0 && !self.sources[index].is_last_page() {
                break;
            }
        }
        Ok(())
    }

    fn reveal(&mut self, target: usize) -> usize {
        let before = self.visible;
        self.visible = self.visible.max(target.min(self.contiguous()));
        self.visible - before
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> PaginatedView<T> for SequencedPagination<T> {
    fn collection(&self) -> Vec<&T> {
        self.sources
            .iter()
            .flat_map(|s| s.items().iter())
            .take(self.visible)
            .collect()
    }

    fn is_last_page(&self) -> bool {
        self.sources.iter().all(Paginator::is_last_page) && self.visible >= self.buffered()
    }

    fn total(&self) -> u64 {
        self.sources.iter().map(Paginator::total).sum()
    }

    fn is_loading(&self) -> bool {
        self.sources.iter().any(Paginator::is_loading)
    }

    async fn first_page(&mut self, params: QueryParams) -> Result<usize, PaginationError> {
        self.visible = 0;
        self.started = true;

        let results = join_all(
            self.sources
                .iter_mut()
                .map(|source| source.first_page(params.clone())),
        )
        .await;

        let failure = results
            .into_iter()
            .enumerate()
            .find_map(|(index, result)| result.err().map(|e| PaginationError::in_sequence(index, e)));

        let target = self.page_size;
        if let Some(error) = failure {
            tracing::warn!(%error, "sequenced first page failed");
            self.reveal(target);
            return Err(error);
        }

        self.fill(target).await?;
        Ok(self.reveal(target))
    }

    async fn next_page(&mut self) -> Result<usize, PaginationError> {
        if !self.started {
            return Err(PaginationError::NotStarted);
        }
        let target = self.visible + self.page_size;
        let filled = self.fill(target).await;
        let revealed = self.reveal(target);
        filled.map(|()| revealed)
    }
}
