//! Test doubles for project-explore
//!
//! Scripted and recording implementations of the source traits, plus a small
//! fixture catalog used by the controller tests.
//!
//! Only available when compiled with `cfg(test)`.

use crate::models::{Category, City, Project};
use crate::params::QueryParams;
use crate::search::{Query, QueryObserver, SearchError};
use crate::source::{
    CategorySource, CitySource, MemoryBackend, Page, PageRequest, PageSource, ProjectCatalog, ProjectModel,
    SourceError,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Page source yielding consecutive numbers
///
/// Records every request it receives and can be told to fail on one page.
#[derive(Debug)]
pub struct NumberSource {
    start: u32,
    len: u32,
    fail_on: Option<u32>,
    delay: Option<Duration>,
    requests: Mutex<Vec<PageRequest>>,
}

impl NumberSource {
    /// `0..len`
    pub fn new(len: u32) -> Self {
        Self::starting_at(0, len)
    }

    /// `start..start + len`
    pub fn starting_at(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            fail_on: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn fail_on_page(mut self, page: u32) -> Self {
        self.fail_on = Some(page);
        self
    }

    /// Answer every page after `delay`
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource<u32> for NumberSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<u32>, SourceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(request.page) {
            return Err(SourceError::Unavailable(format!("page {} refused", request.page)));
        }

        let offset = u32::try_from(request.offset()).unwrap();
        let from = (self.start + offset).min(self.start + self.len);
        let to = (from + request.page_size).min(self.start + self.len);
        let total = request.exact_count.then_some(u64::from(self.len));
        Ok(Page::new((from..to).collect(), total))
    }
}

/// City directory returning a fixed list
#[derive(Debug, Default)]
pub struct ScriptedCities {
    cities: Vec<City>,
    fail: bool,
    delay: Option<Duration>,
    last_params: Mutex<Option<QueryParams>>,
}

impl ScriptedCities {
    pub fn new(cities: Vec<City>) -> Self {
        Self {
            cities,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Answer only after `delay`
    #[must_use]
    pub const fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_params(&self) -> Option<QueryParams> {
        self.last_params.lock().unwrap().clone()
    }
}

#[async_trait]
impl CitySource for ScriptedCities {
    async fn fetch_cities(&self, params: &QueryParams) -> Result<Vec<City>, SourceError> {
        *self.last_params.lock().unwrap() = Some(params.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Unavailable("city directory down".into()));
        }
        Ok(self.cities.clone())
    }
}

/// Category endpoint that always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCategories;

#[async_trait]
impl CategorySource for FailingCategories {
    async fn fetch_categories(&self, _request: &PageRequest) -> Result<Vec<Category>, SourceError> {
        Err(SourceError::Unavailable("categories endpoint down".into()))
    }
}

/// Catalog wrapper that records listing calls and can fail on demand
pub struct RecordingCatalog {
    inner: MemoryBackend,
    calls: Mutex<Vec<(ProjectModel, PageRequest)>>,
    fail_listing: AtomicBool,
    fail_counts: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingCatalog {
    pub fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_listing: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    /// Listing requests (count probes excluded)
    pub fn listing_calls(&self) -> Vec<(ProjectModel, PageRequest)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, request)| !is_count_probe(request))
            .cloned()
            .collect()
    }

    /// Count probes only
    pub fn count_calls(&self) -> Vec<(ProjectModel, PageRequest)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, request)| is_count_probe(request))
            .cloned()
            .collect()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    /// Delay every answer by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }
}

fn is_count_probe(request: &PageRequest) -> bool {
    request.params.get("select") == Some("project_id")
}

#[async_trait]
impl ProjectCatalog for RecordingCatalog {
    async fn fetch_projects(&self, model: ProjectModel, request: &PageRequest) -> Result<Page<Project>, SourceError> {
        self.calls.lock().unwrap().push((model, request.clone()));
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = if is_count_probe(request) {
            self.fail_counts.load(Ordering::SeqCst)
        } else {
            self.fail_listing.load(Ordering::SeqCst)
        };
        if failing {
            return Err(SourceError::Unavailable("listing endpoint down".into()));
        }
        self.inner.fetch_projects(model, request).await
    }
}

/// Observer that keeps every query it is handed
#[derive(Debug, Default)]
pub struct RecordingObserver {
    queries: Mutex<Vec<Query>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl QueryObserver for RecordingObserver {
    fn next(&self, query: &Query) {
        self.queries.lock().unwrap().push(query.clone());
    }

    fn error(&self, error: &SearchError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Small catalog spanning two states, a few categories and both models
///
/// Campinas has two active projects, São Paulo state has one more outside
/// Campinas, Pernambuco has one. One Campinas project is finished.
pub fn sample_backend() -> MemoryBackend {
    let projects = vec![
        json!({"project_id": 1, "project_name": "Bike lanes", "category_id": 1, "mode": "aon",
               "state": "online", "state_order": "published", "open_for_contributions": true,
               "recommended": true, "pledged": 500.0, "score": 9.0,
               "state_acronym": "SP", "city_name": "Campinas", "full_text_index": "bike lanes campinas"}),
        json!({"project_id": 2, "project_name": "Community garden", "category_id": 2, "mode": "sub",
               "state": "online", "state_order": "published", "open_for_contributions": true,
               "recommended": true, "pledged": 800.0, "score": 5.0,
               "state_acronym": "SP", "city_name": "Campinas", "full_text_index": "community garden"}),
        json!({"project_id": 3, "project_name": "Street library", "category_id": 1, "mode": "flex",
               "state": "online", "state_order": "published", "open_for_contributions": true,
               "recommended": true, "pledged": 300.0, "score": 7.0,
               "state_acronym": "SP", "city_name": "Santos", "full_text_index": "street library books"}),
        json!({"project_id": 4, "project_name": "Frevo album", "category_id": 3, "mode": "aon",
               "state": "online", "state_order": "published", "open_for_contributions": true,
               "recommended": true, "pledged": 1200.0, "score": 8.0,
               "state_acronym": "PE", "city_name": "Recife", "full_text_index": "frevo album music"}),
        json!({"project_id": 5, "project_name": "Old mural", "category_id": 1, "mode": "aon",
               "state": "successful", "state_order": "finished", "open_for_contributions": false,
               "recommended": true, "pledged": 2000.0, "score": 3.0,
               "state_acronym": "SP", "city_name": "Campinas", "full_text_index": "old mural art"}),
    ];
    let categories = vec![Category::new(1, "Art"), Category::new(2, "Community"), Category::new(3, "Music")];
    let cities = vec![
        indexed_city("Campinas", "SP", "São Paulo"),
        indexed_city("Santos", "SP", "São Paulo"),
        indexed_city("Recife", "PE", "Pernambuco"),
    ];

    MemoryBackend::new()
        .with_projects(&projects)
        .and_then(|b| b.with_categories(&categories))
        .and_then(|b| b.with_cities(&cities))
        .unwrap()
}

/// City with its accent-free search index filled in
pub fn indexed_city(name: &str, acronym: &str, state_name: &str) -> City {
    City {
        search_index: Some(crate::geo::normalize(name)),
        ..City::new(name, acronym, state_name)
    }
}
