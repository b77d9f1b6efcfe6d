//! Data-source seams
//!
//! The explore flow never talks to a transport directly. It reads through
//! these traits, so the REST client, a fixture directory or a test double
//! can sit behind them interchangeably.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │  ProjectCatalog          │  ← listing endpoint, per model
//! │  CategorySource          │  ← category endpoint
//! │  CitySource              │  ← city directory
//! └──────────────────────────┘
//!            ▲
//!            │ implements
//!    ┌───────┴────────┬─────────────┐
//!    │                │             │
//!  MemoryBackend   REST client   test doubles
//!
//! ┌──────────────────────────┐
//! │  PageSource<T>           │  ← what paginators consume
//! │  (ModelPages adapts a    │
//! │   catalog + model)       │
//! └──────────────────────────┘
//! ```

pub mod error;
pub mod memory;

pub use error::SourceError;
pub use memory::MemoryBackend;

use crate::models::{Category, City, Project};
use crate::params::{FilterBuilder, QueryParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One page request against a paged endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub params: QueryParams,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Ask the service for an exact total alongside the rows
    pub exact_count: bool,
}

impl PageRequest {
    #[must_use]
    pub const fn new(params: QueryParams, page: u32, page_size: u32) -> Self {
        Self {
            params,
            page,
            page_size,
            exact_count: false,
        }
    }

    #[must_use]
    pub const fn with_exact_count(mut self, exact: bool) -> Self {
        self.exact_count = exact;
        self
    }

    /// Zero-based offset of the first row
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }
}

/// Rows of one page plus the total when it was requested
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total: Option<u64>) -> Self {
        Self { items, total }
    }
}

/// Anything a paginator can pull pages from
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, SourceError>;
}

/// Which listing backs a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectModel {
    /// Live and recent projects
    Active,
    /// Projects whose campaign has ended
    Finished,
}

impl fmt::Display for ProjectModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("projects"),
            Self::Finished => f.write_str("finished_projects"),
        }
    }
}

/// Project listing endpoint
#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    async fn fetch_projects(&self, model: ProjectModel, request: &PageRequest) -> Result<Page<Project>, SourceError>;

    /// Exact number of rows matching `params`
    ///
    /// The default asks for a single minimal row with an exact count.
    async fn count_projects(&self, model: ProjectModel, params: &QueryParams) -> Result<u64, SourceError> {
        let params = params
            .clone()
            .merged(&FilterBuilder::new().select(&["project_id"]).parameters());
        let request = PageRequest::new(params, 1, 1).with_exact_count(true);
        let page = self.fetch_projects(model, &request).await?;
        Ok(page.total.unwrap_or(page.items.len() as u64))
    }
}

/// Category endpoint
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn fetch_categories(&self, request: &PageRequest) -> Result<Vec<Category>, SourceError>;
}

/// City directory endpoint
#[async_trait]
pub trait CitySource: Send + Sync {
    async fn fetch_cities(&self, params: &QueryParams) -> Result<Vec<City>, SourceError>;
}

/// [`PageSource`] over one model of a [`ProjectCatalog`]
#[derive(Clone)]
pub struct ModelPages {
    catalog: Arc<dyn ProjectCatalog>,
    model: ProjectModel,
}

impl ModelPages {
    #[must_use]
    pub fn new(catalog: Arc<dyn ProjectCatalog>, model: ProjectModel) -> Self {
        Self { catalog, model }
    }

    #[must_use]
    pub const fn model(&self) -> ProjectModel {
        self.model
    }
}

#[async_trait]
impl PageSource<Project> for ModelPages {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Project>, SourceError> {
        self.catalog.fetch_projects(self.model, request).await
    }
}
