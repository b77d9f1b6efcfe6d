//! Filter data structures
//!
//! - `Predicate`: the constraint a filter adds to the listing query
//! - `ProjectFilter`: a named predicate with its display metadata
//! - `keys`: the well-known filter and mode keys

use crate::params::{Direction, FilterBuilder, QueryParams};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Well-known registry keys
pub mod keys {
    pub const ALL: &str = "all";
    pub const FINISHED: &str = "finished";
    pub const PROJECTS_WE_LOVE: &str = "projects_we_love";
    pub const SAVED_PROJECTS: &str = "saved_projects";
    pub const CONTRIBUTED_BY_FRIENDS: &str = "contributed_by_friends";
    pub const EXPIRING: &str = "expiring";
    pub const RECENT: &str = "recent";

    pub const ALL_MODES: &str = "all_modes";
    pub const SUB: &str = "sub";
    pub const NOT_SUB: &str = "not_sub";
    pub const COVID_19: &str = "covid_19";
}

/// Timestamp layout used for date comparisons against the catalog
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Constraint contributed by a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// No constraint
    None,
    /// `field = value`
    Eq { field: String, value: String },
    /// `field <> value`
    NotEq { field: String, value: String },
    /// Case-insensitive partial match
    Ilike { field: String, term: String },
    /// `expires_at` falls within the next `days` days
    ExpiringWithin { days: i64 },
    /// `online_date` falls within the last `days` days
    OnlineSince { days: i64 },
}

impl Predicate {
    #[must_use]
    pub fn eq(field: &str, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn not_eq(field: &str, value: impl Into<String>) -> Self {
        Self::NotEq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Render into query parameters relative to `now`
    #[must_use]
    pub fn parameters(&self, now: DateTime<Utc>) -> QueryParams {
        let builder = FilterBuilder::new();
        match self {
            Self::None => builder,
            Self::Eq { field, value } => builder.eq(field, value),
            Self::NotEq { field, value } => builder.not_eq(field, value),
            Self::Ilike { field, term } => builder.ilike(field, term),
            Self::ExpiringWithin { days } => {
                let limit = now + Duration::days(*days);
                builder.lte("expires_at", limit.format(TIMESTAMP_FORMAT))
            }
            Self::OnlineSince { days } => {
                let since = now - Duration::days(*days);
                builder.gte("online_date", since.format(TIMESTAMP_FORMAT))
            }
        }
        .parameters()
    }
}

/// A named filter as shown in the explore page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    /// Registry key, e.g. `projects_we_love`
    pub key_name: String,
    /// Title shown in selectors
    pub title: String,
    /// Shorter label for headings
    #[serde(default)]
    pub nicename: Option<String>,
    pub predicate: Predicate,
    /// Whether the filter belongs in the contextual filter bar
    #[serde(default)]
    pub is_contextual: bool,
}

impl ProjectFilter {
    #[must_use]
    pub fn new(key_name: &str, title: &str, predicate: Predicate) -> Self {
        Self {
            key_name: key_name.to_string(),
            title: title.to_string(),
            nicename: None,
            predicate,
            is_contextual: false,
        }
    }

    #[must_use]
    pub fn nicename(mut self, nicename: &str) -> Self {
        self.nicename = Some(nicename.to_string());
        self
    }

    #[must_use]
    pub const fn contextual(mut self) -> Self {
        self.is_contextual = true;
        self
    }

    /// Predicate parameters only
    #[must_use]
    pub fn parameters(&self, now: DateTime<Utc>) -> QueryParams {
        self.predicate.parameters(now)
    }

    /// Predicate parameters plus an ordering clause
    #[must_use]
    pub fn ordered_parameters(&self, now: DateTime<Utc>, order: &[(&str, Direction)]) -> QueryParams {
        self.parameters(now)
            .merged(&FilterBuilder::new().order(order).parameters())
    }

    /// Heading label: nicename when present, title otherwise
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nicename.as_deref().unwrap_or(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_none_predicate_is_empty() {
        assert!(Predicate::None.parameters(now()).is_empty());
    }

    #[test]
    fn test_expiring_window() {
        let params = Predicate::ExpiringWithin { days: 14 }.parameters(now());
        assert_eq!(params.get("expires_at"), Some("lte.2026-11-02T12:00:00"));
    }

    #[test]
    fn test_recent_window() {
        let params = Predicate::OnlineSince { days: 5 }.parameters(now());
        assert_eq!(params.get("online_date"), Some("gte.2026-10-14T12:00:00"));
    }

    #[test]
    fn test_ordered_parameters_keep_predicate() {
        let filter = ProjectFilter::new(keys::PROJECTS_WE_LOVE, "Projects we love", Predicate::eq("recommended", "true"));
        let params = filter.ordered_parameters(now(), &[("score", Direction::Desc)]);

        assert_eq!(params.get("recommended"), Some("eq.true"));
        assert_eq!(params.get("order"), Some("score.desc"));
    }

    #[test]
    fn test_display_name_falls_back_to_title() {
        let plain = ProjectFilter::new(keys::ALL, "All projects", Predicate::None);
        assert_eq!(plain.display_name(), "All projects");
        assert_eq!(plain.clone().nicename("Popular").display_name(), "Popular");
    }
}
