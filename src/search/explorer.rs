//! Explore controller
//!
//! [`ProjectsExplorer`] owns the current search intent and turns it into a
//! paginated project listing. Every search runs in three steps:
//!
//! ```text
//! prepare_search()  ── sync: context filters, model, params, fresh view,
//!        │                  generation += 1, publish query
//!        ▼
//! PendingSearch::run() ── async: first page(s) ∥ best-effort city count
//!        │
//!        ▼
//! apply(CompletedSearch) ── installs the view only if its generation is
//!                           still current; stale results are dropped
//! ```
//!
//! Lightweight setters (`set_mode`, `set_filter`, ...) only publish the new
//! query; the host decides when to search again, usually in response to the
//! published query.

use super::error::SearchError;
use super::state::{ExploreParams, Mode, Query, SearchState};
use super::traits::{NoRedraw, QueryObserver, Redraw, Session};
use crate::categories::CategoryCache;
use crate::config::ExploreConfig;
use crate::filters::{ContextFilters, FilterRegistry, ProjectFilter, keys};
use crate::geo;
use crate::models::{Category, CityState, Project};
use crate::pagination::{EmptyView, PaginatedView, PaginationError, Paginator, SequencedPagination};
use crate::params::{Direction, FilterBuilder, QueryParams};
use crate::source::{CategorySource, CitySource, ModelPages, PageSource, ProjectCatalog, ProjectModel};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Ordering of the finished listing
pub const FINISHED_ORDER: &[(&str, Direction)] = &[
    ("state_order", Direction::Asc),
    ("state", Direction::Desc),
    ("pledged", Direction::Desc),
];

/// Ordering of every other listing
pub const ACTIVE_ORDER: &[(&str, Direction)] = &[
    ("open_for_contributions", Direction::Desc),
    ("state_order", Direction::Asc),
    ("state", Direction::Desc),
    ("score", Direction::Desc),
    ("pledged", Direction::Desc),
];

const TEXT_SEARCH_FIELDS: &[&str] = &["full_text_index", "project_name"];

/// Lifecycle of the most recent search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// No search has run yet
    #[default]
    Idle,
    Loading { generation: u64 },
    Ready { generation: u64 },
    Failed { generation: u64, message: String },
}

impl SearchPhase {
    /// Generation the phase belongs to, if any
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Loading { generation } | Self::Ready { generation } | Self::Failed { generation, .. } => {
                Some(*generation)
            }
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Shape of the listing behind the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewKind {
    /// Placeholder before the first search
    #[default]
    Empty,
    /// One paged source
    Single,
    /// City matches followed by the rest of the state
    Sequenced,
}

struct CityCount {
    catalog: Arc<dyn ProjectCatalog>,
    model: ProjectModel,
    params: QueryParams,
}

impl CityCount {
    /// Never fails; an unreachable count reads as zero
    async fn run(self) -> u64 {
        match self.catalog.count_projects(self.model, &self.params).await {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!(%error, "city count not found");
                0
            }
        }
    }
}

/// A prepared search, detached from the controller
///
/// Owns everything it needs, so it can be run while the controller keeps
/// serving reads or prepares a newer search.
pub struct PendingSearch {
    generation: u64,
    kind: ViewKind,
    model: ProjectModel,
    view: Box<dyn PaginatedView<Project>>,
    params: QueryParams,
    city_count: Option<CityCount>,
}

impl PendingSearch {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        self.kind
    }

    #[must_use]
    pub const fn model(&self) -> ProjectModel {
        self.model
    }

    /// Parameters shared by every source of the listing
    #[must_use]
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Load the first page(s) and the city count concurrently
    pub async fn run(self) -> CompletedSearch {
        let Self {
            generation,
            kind,
            model: _,
            mut view,
            params,
            city_count,
        } = self;

        let count = async {
            match city_count {
                Some(count) => count.run().await,
                None => 0,
            }
        };
        let (outcome, amount_found_on_location) = tokio::join!(view.first_page(params), count);

        CompletedSearch {
            generation,
            kind,
            view,
            outcome: outcome.map(|_| ()),
            amount_found_on_location,
        }
    }
}

/// Result of [`PendingSearch::run`], ready to be applied
pub struct CompletedSearch {
    generation: u64,
    kind: ViewKind,
    view: Box<dyn PaginatedView<Project>>,
    outcome: Result<(), PaginationError>,
    amount_found_on_location: u64,
}

impl CompletedSearch {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Search, filter and pagination controller for the project listing
pub struct ProjectsExplorer {
    catalog: Arc<dyn ProjectCatalog>,
    category_source: Arc<dyn CategorySource>,
    cities: Arc<dyn CitySource>,
    session: Arc<dyn Session>,
    redraw: Arc<dyn Redraw>,
    registry: Arc<FilterRegistry>,
    config: ExploreConfig,
    categories: Arc<CategoryCache>,
    observer: Option<Arc<dyn QueryObserver>>,

    state: SearchState,
    context: ContextFilters,
    last_query: Query,

    view: Box<dyn PaginatedView<Project>>,
    view_kind: ViewKind,
    phase: SearchPhase,
    generation: u64,
    amount_found_on_location: u64,

    found_locations: Vec<CityState>,
    loading_locations: Arc<AtomicBool>,
}

impl ProjectsExplorer {
    #[must_use]
    pub fn builder() -> ProjectsExplorerBuilder {
        ProjectsExplorerBuilder::default()
    }

    /// Load categories and run the initial search concurrently
    ///
    /// A failed category load is logged and otherwise ignored; the listing
    /// does not depend on it.
    ///
    /// # Errors
    ///
    /// Returns the initial search's error, if any.
    pub async fn start(&mut self) -> Result<(), SearchError> {
        let cache = Arc::clone(&self.categories);
        let source = Arc::clone(&self.category_source);
        let load = async move { cache.load(source.as_ref()).await };

        let (loaded, searched) = tokio::join!(load, self.execute_search());

        if loaded.is_ok() {
            self.adopt_seeded_category();
            self.redraw.redraw();
        }
        searched
    }

    fn adopt_seeded_category(&mut self) {
        let Some(id) = self.state.category_id else {
            return;
        };
        if self.state.category.id == Some(id) {
            return;
        }
        if let Some(category) = self.categories.find(id) {
            tracing::debug!(id, name = %category.name, "adopted seeded category");
            self.state.category = category;
        }
    }

    /// Replace the whole search intent and run it
    ///
    /// # Errors
    ///
    /// Returns the search's error, if any. An unresolvable category is not an
    /// error: the selection falls back to all categories.
    pub async fn search(&mut self, params: ExploreParams) -> Result<(), SearchError> {
        self.state.apply(&params);

        let resolved = match self.state.category_id {
            Some(id) => Some((id, self.categories.resolve(id).await)),
            None => None,
        };

        match resolved {
            Some((_, Ok(category))) => {
                self.state.category = category;
                self.redraw.redraw();
            }
            Some((id, Err(error))) => {
                tracing::warn!(%error, id, "category lookup failed, showing all categories");
                self.set_category(Category::all());
            }
            None => {
                self.state.category = Category::all();
                self.redraw.redraw();
            }
        }

        self.execute_search().await
    }

    /// Register the query observer, replacing any previous one
    pub fn subscribe(&mut self, observer: Arc<dyn QueryObserver>) {
        self.observer = Some(observer);
    }

    /// Prepare, run and apply a search
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Pagination` if the first page failed to load.
    pub async fn execute_search(&mut self) -> Result<(), SearchError> {
        let pending = self.prepare_search();
        let completed = pending.run().await;
        self.apply(completed).map(|_| ())
    }

    /// Synchronous half of a search
    ///
    /// Recomputes context filters, picks the model, composes the parameters,
    /// builds a fresh view and publishes the query. The returned search has a
    /// new generation; any older pending search becomes stale.
    pub fn prepare_search(&mut self) -> PendingSearch {
        self.refresh_context();

        let model = self.state.model();
        let params = self.listing_parameters(Utc::now());
        let (view, kind) = self.build_view(model);
        let city_count = self.state.city_name().map(|city| CityCount {
            catalog: Arc::clone(&self.catalog),
            model,
            params: params
                .clone()
                .merged(&FilterBuilder::new().eq("city_name", city).parameters()),
        });

        self.generation += 1;
        self.phase = SearchPhase::Loading {
            generation: self.generation,
        };
        tracing::debug!(generation = self.generation, %model, %params, ?kind, "search dispatched");

        self.publish_query();
        self.redraw.redraw();

        PendingSearch {
            generation: self.generation,
            kind,
            model,
            view,
            params,
            city_count,
        }
    }

    /// Install a completed search if it is still the latest
    ///
    /// Returns `Ok(false)` when the result was stale and dropped.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Pagination` when the current search failed to
    /// load its first page. The view is still installed, so rows that did
    /// arrive remain visible and `next_page` can retry.
    pub fn apply(&mut self, completed: CompletedSearch) -> Result<bool, SearchError> {
        let CompletedSearch {
            generation,
            kind,
            view,
            outcome,
            amount_found_on_location,
        } = completed;

        if generation != self.generation {
            tracing::debug!(stale = generation, current = self.generation, "discarding stale search");
            return Ok(false);
        }

        self.view = view;
        self.view_kind = kind;
        self.amount_found_on_location = amount_found_on_location;

        let result = match outcome {
            Ok(()) => {
                self.phase = SearchPhase::Ready { generation };
                Ok(true)
            }
            Err(error) => {
                self.phase = SearchPhase::Failed {
                    generation,
                    message: error.to_string(),
                };
                let error = SearchError::from(error);
                if let Some(observer) = &self.observer {
                    observer.error(&error);
                }
                Err(error)
            }
        };
        self.redraw.redraw();
        result
    }

    /// Load the next page of the current listing
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Pagination` if the page failed to load.
    pub async fn next_page(&mut self) -> Result<usize, SearchError> {
        let result = self.view.next_page().await;
        self.redraw.redraw();
        Ok(result?)
    }

    fn refresh_context(&mut self) {
        self.context = ContextFilters::for_session(self.session.is_logged_in());
        if self.state.mode == Mode::Sub {
            self.context.remove(keys::FINISHED);
            self.context.remove(keys::EXPIRING);
            self.state.filter = keys::ALL.to_string();
        }
    }

    /// Parameters shared by every source of the current listing
    #[must_use]
    pub fn listing_parameters(&self, now: DateTime<Utc>) -> QueryParams {
        let finished = self.state.filter == keys::FINISHED;
        let order = if finished { FINISHED_ORDER } else { ACTIVE_ORDER };
        let mut params = QueryParams::new();

        match self.registry.get(self.state.mode.as_str()) {
            Some(mode) => params.extend(&mode.parameters(now)),
            None => tracing::warn!(mode = %self.state.mode, "mode missing from filter registry"),
        }

        match self.registry.get(&self.state.filter) {
            Some(filter) => params.extend(&filter.ordered_parameters(now, order)),
            None => {
                tracing::warn!(filter = %self.state.filter, "filter missing from filter registry");
                params.extend(&FilterBuilder::new().order(order).parameters());
            }
        }

        let mut builder = FilterBuilder::new();
        if !finished {
            builder = builder.eq("open_for_contributions", true);
        }
        if let Some(id) = self.state.category_id {
            builder = builder.eq("category_id", id);
        }
        if let Some(city_state) = &self.state.city_state
            && city_state.city_name().is_none()
        {
            builder = builder.eq("state_acronym", &city_state.state.acronym);
        }
        if self.state.is_text_search() {
            builder = builder.text_search(TEXT_SEARCH_FIELDS, &self.state.search_param);
        }
        params.extend(&builder.parameters());
        params
    }

    fn build_view(&self, model: ProjectModel) -> (Box<dyn PaginatedView<Project>>, ViewKind) {
        let pages: Arc<dyn PageSource<Project>> = Arc::new(ModelPages::new(Arc::clone(&self.catalog), model));
        let page_size = self.config.page_size;
        let exact = self.config.exact_count;

        let split = self
            .state
            .city_state
            .as_ref()
            .and_then(|cs| cs.city_name().map(|city| (cs, city)));
        let Some((city_state, city)) = split else {
            return (
                Box::new(Paginator::new(pages, page_size).with_exact_count(exact)),
                ViewKind::Single,
            );
        };

        let in_city = FilterBuilder::new().eq("city_name", city).parameters();
        let rest_of_state = FilterBuilder::new()
            .eq("state_acronym", &city_state.state.acronym)
            .not_eq("city_name", city)
            .parameters();
        let sources = vec![
            Paginator::new(Arc::clone(&pages), page_size)
                .with_params(in_city)
                .with_exact_count(exact),
            Paginator::new(pages, page_size)
                .with_params(rest_of_state)
                .with_exact_count(exact),
        ];
        (Box::new(SequencedPagination::new(sources, page_size)), ViewKind::Sequenced)
    }

    /// Snapshot the query; notify the observer only if it changed
    fn publish_query(&mut self) {
        let query = self.state.query();
        if query == self.last_query {
            return;
        }
        tracing::debug!(?query, "query changed");
        self.last_query = query;
        if let Some(observer) = &self.observer {
            observer.next(&self.last_query);
        }
    }

    /// Look up cities and group them by state
    ///
    /// The loading flag is raised only if the directory takes longer than the
    /// configured delay.
    ///
    /// # Errors
    ///
    /// Propagates the directory's error; previous results are kept.
    pub async fn search_locations(&mut self, text: &str) -> Result<(), SearchError> {
        let cities = Arc::clone(&self.cities);
        let loading = Arc::clone(&self.loading_locations);
        let redraw = Arc::clone(&self.redraw);

        let result = geo::await_with_loading_flag(
            geo::search_cities_grouped_by_state(cities.as_ref(), text),
            self.config.location_loading_delay(),
            || {
                loading.store(true, Ordering::SeqCst);
                redraw.redraw();
            },
        )
        .await;

        self.loading_locations.store(false, Ordering::SeqCst);
        self.redraw.redraw();

        self.found_locations = result?;
        Ok(())
    }

    #[must_use]
    pub fn found_locations(&self) -> &[CityState] {
        &self.found_locations
    }

    #[must_use]
    pub fn is_loading_locations_search(&self) -> bool {
        self.loading_locations.load(Ordering::SeqCst)
    }

    /// Shared handle on the location loading flag
    #[must_use]
    pub fn loading_locations_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.loading_locations)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
        match mode {
            Mode::Sub => self.state.filter = keys::ALL.to_string(),
            Mode::AllModes => self.state.filter = keys::PROJECTS_WE_LOVE.to_string(),
            Mode::NotSub | Mode::Covid19 => {}
        }
        self.refresh_context();
        self.publish_query();
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Registry title of the current mode
    #[must_use]
    pub fn mode_name(&self) -> Option<&str> {
        self.registry.get(self.state.mode.as_str()).map(|f| f.title.as_str())
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.state.filter = filter.into();
        self.publish_query();
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.state.filter
    }

    /// Heading label of the current filter
    #[must_use]
    pub fn filter_name(&self) -> Option<&str> {
        self.registry.get(&self.state.filter).map(ProjectFilter::display_name)
    }

    pub fn set_category(&mut self, category: Category) {
        self.state.category_id = category.id;
        self.state.category = category;
        self.publish_query();
        self.redraw.redraw();
    }

    /// Select a category by id, waiting for the category load if needed
    ///
    /// Falls back to all categories when the id cannot be resolved.
    pub async fn set_category_id(&mut self, id: Option<i64>) {
        self.state.category_id = id;
        let Some(id) = id else {
            self.set_category(Category::all());
            return;
        };

        let resolved = self.categories.resolve(id).await;
        match resolved {
            Ok(category) => self.set_category(category),
            Err(error) => {
                tracing::warn!(%error, id, "category lookup failed, showing all categories");
                self.set_category(Category::all());
            }
        }
    }

    #[must_use]
    pub const fn category(&self) -> &Category {
        &self.state.category
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<i64> {
        self.state.category_id
    }

    /// Loaded categories, sentinel first
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.categories.categories()
    }

    /// Shared category cache
    #[must_use]
    pub fn category_cache(&self) -> Arc<CategoryCache> {
        Arc::clone(&self.categories)
    }

    pub fn set_city_state(&mut self, city_state: Option<CityState>) {
        self.state.city_state = city_state;
        self.publish_query();
    }

    #[must_use]
    pub const fn city_state(&self) -> Option<&CityState> {
        self.state.city_state.as_ref()
    }

    /// Projects in the selected city, from the last applied search
    #[must_use]
    pub const fn amount_found_on_location(&self) -> u64 {
        self.amount_found_on_location
    }

    #[must_use]
    pub fn is_text_search(&self) -> bool {
        self.state.is_text_search()
    }

    #[must_use]
    pub fn search_param(&self) -> &str {
        &self.state.search_param
    }

    /// Contextual filters visible to this visitor, in allow-list order
    #[must_use]
    pub fn filters(&self) -> Vec<&ProjectFilter> {
        self.registry.contextual(&self.context)
    }

    #[must_use]
    pub const fn context_filters(&self) -> &ContextFilters {
        &self.context
    }

    #[must_use]
    pub fn projects_view(&self) -> &dyn PaginatedView<Project> {
        self.view.as_ref()
    }

    /// Rows loaded so far
    #[must_use]
    pub fn projects(&self) -> Vec<&Project> {
        self.view.collection()
    }

    #[must_use]
    pub const fn view_kind(&self) -> ViewKind {
        self.view_kind
    }

    #[must_use]
    pub const fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Query as last published
    #[must_use]
    pub const fn last_query(&self) -> &Query {
        &self.last_query
    }

    /// Query derived from the current state
    #[must_use]
    pub fn query(&self) -> Query {
        self.state.query()
    }

    #[must_use]
    pub const fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Stop pending category waits
    pub fn shutdown(&self) {
        self.categories.cancel();
    }
}

/// Builder for [`ProjectsExplorer`]
#[derive(Default)]
pub struct ProjectsExplorerBuilder {
    catalog: Option<Arc<dyn ProjectCatalog>>,
    category_source: Option<Arc<dyn CategorySource>>,
    cities: Option<Arc<dyn CitySource>>,
    session: Option<Arc<dyn Session>>,
    redraw: Option<Arc<dyn Redraw>>,
    registry: Option<Arc<FilterRegistry>>,
    config: Option<ExploreConfig>,
    observer: Option<Arc<dyn QueryObserver>>,
    cancellation: Option<CancellationToken>,
    params: ExploreParams,
}

impl ProjectsExplorerBuilder {
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn ProjectCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn category_source(mut self, source: Arc<dyn CategorySource>) -> Self {
        self.category_source = Some(source);
        self
    }

    #[must_use]
    pub fn cities(mut self, cities: Arc<dyn CitySource>) -> Self {
        self.cities = Some(cities);
        self
    }

    #[must_use]
    pub fn session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn redraw(mut self, redraw: Arc<dyn Redraw>) -> Self {
        self.redraw = Some(redraw);
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: Arc<FilterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ExploreConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Token that cancels pending category waits
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Initial search intent
    #[must_use]
    pub fn params(mut self, params: ExploreParams) -> Self {
        self.params = params;
        self
    }

    /// Assemble the controller
    ///
    /// # Errors
    ///
    /// Returns `SearchError::BuildError` if the catalog, category source,
    /// city directory or session is missing.
    pub fn build(self) -> Result<ProjectsExplorer, SearchError> {
        let catalog = self
            .catalog
            .ok_or_else(|| SearchError::BuildError("project catalog is required".into()))?;
        let category_source = self
            .category_source
            .ok_or_else(|| SearchError::BuildError("category source is required".into()))?;
        let cities = self
            .cities
            .ok_or_else(|| SearchError::BuildError("city directory is required".into()))?;
        let session = self
            .session
            .ok_or_else(|| SearchError::BuildError("session is required".into()))?;

        let config = self.config.unwrap_or_default();
        let mut categories = CategoryCache::from_config(&config);
        if let Some(token) = self.cancellation {
            categories = categories.with_cancellation(token);
        }

        let state = SearchState::from_params(&self.params);
        let context = ContextFilters::for_session(session.is_logged_in());
        let last_query = state.query();

        Ok(ProjectsExplorer {
            catalog,
            category_source,
            cities,
            session,
            redraw: self.redraw.unwrap_or_else(|| Arc::new(NoRedraw)),
            registry: self.registry.unwrap_or_default(),
            config,
            categories: Arc::new(categories),
            observer: self.observer,
            state,
            context,
            last_query,
            view: Box::new(EmptyView::new()),
            view_kind: ViewKind::Empty,
            phase: SearchPhase::Idle,
            generation: 0,
            amount_found_on_location: 0,
            found_locations: Vec::new(),
            loading_locations: Arc::new(AtomicBool::new(false)),
        })
    }
}
