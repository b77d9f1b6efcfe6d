//! Single-source paginator

use super::{PaginatedView, PaginationError};
use crate::params::QueryParams;
use crate::source::{PageRequest, PageSource};
use async_trait::async_trait;
use std::sync::Arc;

/// Pages through one [`PageSource`], accumulating rows
///
/// Parameters given at construction are specific to this source and are
/// laid over whatever `first_page` receives.
pub struct Paginator<T> {
    source: Arc<dyn PageSource<T>>,
    base_params: QueryParams,
    active_params: Option<QueryParams>,
    page_size: u32,
    exact_count: bool,
    page: u32,
    items: Vec<T>,
    total: Option<u64>,
    exhausted: bool,
    loading: bool,
}

impl<T: Send + Sync + 'static> Paginator<T> {
    #[must_use]
    pub fn new(source: Arc<dyn PageSource<T>>, page_size: u32) -> Self {
        Self {
            source,
            base_params: QueryParams::new(),
            active_params: None,
            page_size: page_size.max(1),
            exact_count: true,
            page: 0,
            items: Vec::new(),
            total: None,
            exhausted: false,
            loading: false,
        }
    }

    /// Parameters that always apply to this source
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.base_params = params;
        self
    }

    /// Whether to request exact totals
    #[must_use]
    pub const fn with_exact_count(mut self, exact: bool) -> Self {
        self.exact_count = exact;
        self
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Pages loaded so far
    #[must_use]
    pub const fn pages_loaded(&self) -> u32 {
        self.page
    }

    /// Parameters of the current run, once started
    #[must_use]
    pub const fn active_params(&self) -> Option<&QueryParams> {
        self.active_params.as_ref()
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    async fn load(&mut self, page: u32) -> Result<usize, PaginationError> {
        let params = self
            .active_params
            .clone()
            .ok_or(PaginationError::NotStarted)?;
        let request = PageRequest::new(params, page, self.page_size).with_exact_count(self.exact_count);

        self.loading = true;
        let result = self.source.fetch_page(&request).await;
        self.loading = false;

        let fetched = result?;
        let count = fetched.items.len();
        if fetched.total.is_some() {
            self.total = fetched.total;
        }
        self.page = page;
        self.items.extend(fetched.items);

        let short_page = count < self.page_size as usize;
        let counted_out = self.total.is_some_and(|t| self.items.len() as u64 >= t);
        self.exhausted = short_page || counted_out;
        Ok(count)
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> PaginatedView<T> for Paginator<T> {
    fn collection(&self) -> Vec<&T> {
        self.items.iter().collect()
    }

    fn is_last_page(&self) -> bool {
        self.active_params.is_none() || self.exhausted
    }

    fn total(&self) -> u64 {
        self.total.unwrap_or(self.items.len() as u64)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    async fn first_page(&mut self, params: QueryParams) -> Result<usize, PaginationError> {
        self.active_params = Some(params.merged(&self.base_params));
        self.items.clear();
        self.total = None;
        self.page = 0;
        self.exhausted = false;
        self.load(1).await
    }

    async fn next_page(&mut self) -> Result<usize, PaginationError> {
        if self.active_params.is_none() {
            return Err(PaginationError::NotStarted);
        }
        if self.exhausted {
            return Ok(0);
        }
        self.load(self.page + 1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NumberSource;

    #[tokio::test]
    async fn test_pages_accumulate() {
        let source = Arc::new(NumberSource::new(20));
        let mut pages = Paginator::<u32>::new(source, 9);

        assert_eq!(pages.first_page(QueryParams::new()).await.unwrap(), 9);
        assert_eq!(pages.total(), 20);
        assert!(!pages.is_last_page());

        assert_eq!(pages.next_page().await.unwrap(), 9);
        assert_eq!(pages.next_page().await.unwrap(), 2);
        assert!(pages.is_last_page());
        assert_eq!(pages.next_page().await.unwrap(), 0);

        let collected: Vec<u32> = pages.collection().into_iter().copied().collect();
        assert_eq!(collected, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_on_count() {
        let mut pages = Paginator::<u32>::new(Arc::new(NumberSource::new(18)), 9);
        pages.first_page(QueryParams::new()).await.unwrap();
        pages.next_page().await.unwrap();

        assert!(pages.is_last_page());
        assert_eq!(pages.pages_loaded(), 2);
    }

    #[tokio::test]
    async fn test_next_page_before_first_fails() {
        let mut pages = Paginator::<u32>::new(Arc::new(NumberSource::new(5)), 9);
        assert!(matches!(pages.next_page().await, Err(PaginationError::NotStarted)));
    }

    #[tokio::test]
    async fn test_base_params_override_shared_params() {
        let source = Arc::new(NumberSource::new(5));
        let base: QueryParams = [("city_name", "eq.Campinas")].into_iter().collect();
        let shared: QueryParams = [("city_name", "eq.Other"), ("category_id", "eq.1")].into_iter().collect();

        let mut pages = Paginator::<u32>::new(Arc::clone(&source) as Arc<dyn PageSource<u32>>, 9).with_params(base);
        pages.first_page(shared).await.unwrap();

        let sent = source.requests();
        assert_eq!(sent[0].params.get("city_name"), Some("eq.Campinas"));
        assert_eq!(sent[0].params.get("category_id"), Some("eq.1"));
        assert!(sent[0].exact_count);
    }

    #[tokio::test]
    async fn test_first_page_restarts() {
        let mut pages = Paginator::<u32>::new(Arc::new(NumberSource::new(30)), 9);
        pages.first_page(QueryParams::new()).await.unwrap();
        pages.next_page().await.unwrap();
        pages.first_page(QueryParams::new()).await.unwrap();

        assert_eq!(pages.collection().len(), 9);
        assert_eq!(pages.pages_loaded(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_previous_rows() {
        let source = Arc::new(NumberSource::new(30).fail_on_page(2));
        let mut pages = Paginator::<u32>::new(source, 9);
        pages.first_page(QueryParams::new()).await.unwrap();

        assert!(pages.next_page().await.is_err());
        assert_eq!(pages.collection().len(), 9);
        assert!(!pages.is_loading());
        assert!(!pages.is_last_page());
    }
}
