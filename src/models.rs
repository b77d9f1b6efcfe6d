//! Catalog data types
//!
//! Plain serde records for the rows the explore flow reads: projects,
//! categories and the city directory, plus the `CityState` selection that
//! ties a city to its state.

use serde::{Deserialize, Serialize};

/// Name of the sentinel category that stands for "no category filter"
pub const ALL_CATEGORIES_NAME: &str = "All categories";

/// Remaining or elapsed time as reported by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeDescription {
    pub total: i64,
    pub unit: String,
}

/// Third-party integration attached to a project (e.g. a thematic campaign)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Integration {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A project card as returned by the projects listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub project_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub project_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_order: Option<String>,
    #[serde(default)]
    pub online_date: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub pledged: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub state_acronym: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub open_for_contributions: bool,
    #[serde(default)]
    pub contributed_by_friends: bool,
    #[serde(default)]
    pub saved_projects: bool,
    #[serde(default)]
    pub remaining_time: Option<TimeDescription>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub category_name: Option<String>,
}

/// A project category
///
/// The sentinel returned by [`Category::all`] has no id and always heads
/// the category list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Category {
    /// Create a category with an id
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// The "All categories" sentinel
    #[must_use]
    pub fn all() -> Self {
        Self {
            id: None,
            name: ALL_CATEGORIES_NAME.to_string(),
        }
    }

    /// Whether this is the sentinel
    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.id.is_none()
    }
}

/// A row of the city directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct City {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    /// Acronym of the state the city belongs to
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub search_index: Option<String>,
    #[serde(default)]
    pub state_id: Option<i64>,
    #[serde(default)]
    pub state_name: Option<String>,
}

impl City {
    /// Create a city with its state acronym and name
    #[must_use]
    pub fn new(name: impl Into<String>, acronym: impl Into<String>, state_name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            acronym: Some(acronym.into()),
            search_index: None,
            state_id: None,
            state_name: Some(state_name.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct State {
    pub acronym: String,
    pub state_name: String,
}

impl State {
    #[must_use]
    pub fn new(acronym: impl Into<String>, state_name: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            state_name: state_name.into(),
        }
    }
}

/// A selected geography: a whole state, or one city inside it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CityState {
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<City>,
}

impl CityState {
    /// Selection covering an entire state
    #[must_use]
    pub const fn state(state: State) -> Self {
        Self { state, city: None }
    }

    /// Selection of one city within a state
    #[must_use]
    pub const fn city(state: State, city: City) -> Self {
        Self {
            state,
            city: Some(city),
        }
    }

    /// Name of the selected city, if any
    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        self.city.as_ref().map(|c| c.name.as_str()).filter(|n| !n.is_empty())
    }

    /// Human readable label, e.g. `Campinas, SP` or `São Paulo`
    #[must_use]
    pub fn label(&self) -> String {
        match self.city_name() {
            Some(city) => format!("{city}, {}", self.state.acronym),
            None => self.state.state_name.clone(),
        }
    }
}
