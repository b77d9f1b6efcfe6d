//! Search state and the sparse query derived from it
//!
//! `SearchState` is the controller's private record of what the visitor is
//! looking for. `Query` is the published snapshot: only fields that differ
//! from their defaults are present, so two states that mean the same search
//! produce equal queries.

use crate::filters::keys;
use crate::models::{Category, CityState};
use crate::source::ProjectModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter applied when none is chosen
pub const DEFAULT_FILTER: &str = keys::PROJECTS_WE_LOVE;

/// Top-level campaign family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "all_modes")]
    AllModes,
    #[serde(rename = "sub")]
    Sub,
    #[serde(rename = "not_sub")]
    NotSub,
    #[serde(rename = "covid_19")]
    Covid19,
}

impl Mode {
    /// Registry key of the mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllModes => keys::ALL_MODES,
            Self::Sub => keys::SUB,
            Self::NotSub => keys::NOT_SUB,
            Self::Covid19 => keys::COVID_19,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            keys::ALL_MODES => Ok(Self::AllModes),
            keys::SUB => Ok(Self::Sub),
            keys::NOT_SUB => Ok(Self::NotSub),
            keys::COVID_19 => Ok(Self::Covid19),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Parameters a search starts from (all optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreParams {
    #[serde(default)]
    pub search_param: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub city_state: Option<CityState>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub filter: Option<String>,
}

impl ExploreParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search_param(mut self, text: impl Into<String>) -> Self {
        self.search_param = Some(text.into());
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn city_state(mut self, city_state: CityState) -> Self {
        self.city_state = Some(city_state);
        self
    }

    #[must_use]
    pub const fn category_id(mut self, id: i64) -> Self {
        self.category_id = Some(id);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Sparse snapshot of a search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_acronym: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Query {
    /// Whether every field is at its default
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Mutable search intent owned by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub mode: Mode,
    pub filter: String,
    /// Display object; may lag behind `category_id` while resolving
    pub category: Category,
    pub category_id: Option<i64>,
    pub city_state: Option<CityState>,
    pub search_param: String,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            mode: Mode::AllModes,
            filter: DEFAULT_FILTER.to_string(),
            category: Category::all(),
            category_id: None,
            city_state: None,
            search_param: String::new(),
        }
    }
}

impl SearchState {
    /// State seeded from `params`, defaults elsewhere
    #[must_use]
    pub fn from_params(params: &ExploreParams) -> Self {
        let mut state = Self::default();
        state.apply(params);
        state
    }

    /// Overwrite every field from `params`; absent fields reset to defaults
    ///
    /// The display category is left alone; resolving it is the caller's job.
    pub fn apply(&mut self, params: &ExploreParams) {
        self.mode = params.mode.unwrap_or_default();
        self.category_id = params.category_id;
        self.filter = params
            .filter
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        self.city_state = params.city_state.clone();
        self.search_param = params.search_param.clone().unwrap_or_default();
    }

    /// Listing model backing the current filter
    #[must_use]
    pub fn model(&self) -> ProjectModel {
        if self.filter == keys::FINISHED {
            ProjectModel::Finished
        } else {
            ProjectModel::Active
        }
    }

    /// Selected city name, if a specific city is chosen
    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        self.city_state.as_ref().and_then(CityState::city_name)
    }

    #[must_use]
    pub fn is_text_search(&self) -> bool {
        !self.search_param.is_empty()
    }

    /// Derive the sparse query
    #[must_use]
    pub fn query(&self) -> Query {
        let mut query = Query::default();

        if self.mode != Mode::AllModes {
            query.mode = Some(self.mode);
        }
        query.category_id = self.category_id;

        if let Some(city_state) = &self.city_state {
            query.state_acronym = Some(city_state.state.acronym.clone());
            query.state_name = Some(city_state.state.state_name.clone());
            query.city_name = city_state.city_name().map(str::to_string);
        }

        if self.filter != DEFAULT_FILTER {
            query.filter = Some(self.filter.clone());
        }
        if self.is_text_search() {
            query.search = Some(self.search_param.clone());
        }
        query
    }
}
