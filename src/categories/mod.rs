//! Category cache
//!
//! Categories are bulk-loaded once, ordered by name, behind the "All
//! categories" sentinel. Lookups may arrive before the load finishes: rather
//! than fetching a single category, [`CategoryCache::resolve`] waits for the
//! bulk load already in flight, re-checking on a fixed interval.
//!
//! The wait is bounded by a timeout and can be cancelled, and every timer is
//! a `tokio::time` timer, so tests drive it with paused time.

pub mod error;

pub use error::CategoryError;

use crate::config::ExploreConfig;
use crate::models::Category;
use crate::params::{Direction, FilterBuilder};
use crate::source::{CategorySource, PageRequest};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::{Instant, interval_at, timeout};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug)]
struct CacheState {
    categories: Vec<Category>,
    status: LoadStatus,
    failure: Option<String>,
}

/// Lazily loaded list of categories
#[derive(Debug)]
pub struct CategoryCache {
    state: RwLock<CacheState>,
    page_size: u32,
    poll_interval: Duration,
    wait_limit: Duration,
    cancel: CancellationToken,
}

impl CategoryCache {
    /// Empty cache holding only the sentinel
    #[must_use]
    pub fn new(page_size: u32, poll_interval: Duration, wait_limit: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState {
                categories: vec![Category::all()],
                status: LoadStatus::Pending,
                failure: None,
            }),
            page_size: page_size.max(1),
            poll_interval,
            wait_limit,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ExploreConfig) -> Self {
        Self::new(
            config.category_page_size,
            config.category_poll_interval(),
            config.category_resolve_timeout(),
        )
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fetch every category page and publish the list
    ///
    /// Returns the number of categories loaded (sentinel excluded).
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Source` if a page request fails; pending
    /// lookups then fail with `CategoryError::Unavailable`.
    pub async fn load(&self, source: &dyn CategorySource) -> Result<usize, CategoryError> {
        let params = FilterBuilder::new().order(&[("name", Direction::Asc)]).parameters();
        let mut loaded = Vec::new();
        let mut page = 1;

        loop {
            let request = PageRequest::new(params.clone(), page, self.page_size);
            let batch = match source.fetch_categories(&request).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(error = %e, "category load failed");
                    let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                    state.status = LoadStatus::Failed;
                    state.failure = Some(e.to_string());
                    return Err(e.into());
                }
            };
            let full = batch.len() >= self.page_size as usize;
            loaded.extend(batch);
            if !full {
                break;
            }
            page += 1;
        }

        let count = loaded.len();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.categories = std::iter::once(Category::all()).chain(loaded).collect();
        state.status = LoadStatus::Loaded;
        state.failure = None;
        tracing::info!(count, pages = page, "categories loaded");
        Ok(count)
    }

    /// Snapshot of the list, sentinel first
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .categories
            .clone()
    }

    /// Whether the bulk load has completed
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.status() == LoadStatus::Loaded
    }

    /// Immediate lookup, without waiting
    #[must_use]
    pub fn find(&self, id: i64) -> Option<Category> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .categories
            .iter()
            .find(|c| c.id == Some(id))
            .cloned()
    }

    /// Stop every pending [`CategoryCache::resolve`] wait
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolve `id`, waiting for the bulk load if needed
    ///
    /// # Errors
    ///
    /// - `NotFound` once the cache is loaded and lacks `id` (never earlier)
    /// - `Unavailable` if the bulk load failed
    /// - `Timeout` if the load does not finish within the wait bound
    /// - `Cancelled` if the cache's token is cancelled
    pub async fn resolve(&self, id: i64) -> Result<Category, CategoryError> {
        if let Some(category) = self.find(id) {
            return Ok(category);
        }

        let wait = async {
            let mut ticks = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
            loop {
                tokio::select! {
                    () = self.cancel.cancelled() => return Err(CategoryError::Cancelled),
                    _ = ticks.tick() => {}
                }
                match self.status() {
                    LoadStatus::Pending => {}
                    LoadStatus::Loaded => return self.find(id).ok_or(CategoryError::NotFound(id)),
                    LoadStatus::Failed => return Err(CategoryError::Unavailable(self.failure())),
                }
            }
        };

        timeout(self.wait_limit, wait).await.unwrap_or_else(|_| {
            Err(CategoryError::Timeout {
                id,
                waited_ms: u64::try_from(self.wait_limit.as_millis()).unwrap_or(u64::MAX),
            })
        })
    }

    fn status(&self) -> LoadStatus {
        self.state.read().unwrap_or_else(PoisonError::into_inner).status
    }

    fn failure(&self) -> String {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .failure
            .clone()
            .unwrap_or_default()
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::from_config(&ExploreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryBackend;
    use crate::testing::FailingCategories;
    use std::sync::Arc;

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_categories(&[Category::new(2, "Music"), Category::new(1, "Art"), Category::new(3, "Film")])
            .unwrap()
    }

    fn cache() -> Arc<CategoryCache> {
        Arc::new(CategoryCache::new(100, Duration::from_millis(100), Duration::from_secs(10)))
    }

    #[test]
    fn test_sentinel_is_present_before_load() {
        let cache = cache();
        assert_eq!(cache.categories(), vec![Category::all()]);
        assert!(!cache.is_loaded());
    }

    #[tokio::test]
    async fn test_load_orders_by_name_after_sentinel() {
        let cache = cache();
        let count = cache.load(&backend()).await.unwrap();

        assert_eq!(count, 3);
        let names: Vec<_> = cache.categories().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["All categories", "Art", "Film", "Music"]);
    }

    #[tokio::test]
    async fn test_load_walks_every_page() {
        let rows: Vec<_> = (1..=5).map(|i| Category::new(i, format!("C{i}"))).collect();
        let backend = MemoryBackend::new().with_categories(&rows).unwrap();
        let cache = CategoryCache::new(2, Duration::from_millis(100), Duration::from_secs(1));

        assert_eq!(cache.load(&backend).await.unwrap(), 5);
        assert_eq!(cache.categories().len(), 6);
    }

    #[tokio::test]
    async fn test_resolve_hit_is_immediate() {
        let cache = cache();
        cache.load(&backend()).await.unwrap();
        assert_eq!(cache.resolve(3).await.unwrap().name, "Film");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_waits_for_pending_load() {
        let cache = cache();
        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.resolve(2).await }
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(!waiter.is_finished());

        cache.load(&backend()).await.unwrap();
        assert_eq!(waiter.await.unwrap().unwrap().name, "Music");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_id_fails_only_after_load() {
        let cache = cache();
        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.resolve(99).await }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!waiter.is_finished());

        cache.load(&backend()).await.unwrap();
        assert!(matches!(waiter.await.unwrap(), Err(CategoryError::NotFound(99))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_is_bounded() {
        let cache = Arc::new(CategoryCache::new(100, Duration::from_millis(100), Duration::from_millis(500)));
        let result = cache.resolve(1).await;

        assert!(matches!(result, Err(CategoryError::Timeout { id: 1, waited_ms: 500 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_can_be_cancelled() {
        let token = CancellationToken::new();
        let cache = Arc::new(
            CategoryCache::new(100, Duration::from_millis(100), Duration::from_secs(10))
                .with_cancellation(token.clone()),
        );
        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.resolve(1).await }
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();
        assert!(matches!(waiter.await.unwrap(), Err(CategoryError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_ends_pending_waits() {
        let cache = cache();
        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.resolve(1).await }
        });

        assert!(cache.load(&FailingCategories).await.is_err());
        assert!(matches!(waiter.await.unwrap(), Err(CategoryError::Unavailable(_))));
        assert_eq!(cache.categories(), vec![Category::all()]);
    }
}
