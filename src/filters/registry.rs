//! Filter registry and contextual filter visibility
//!
//! The registry is built once and shared read-only; which filters are
//! offered in the filter bar is decided separately by [`ContextFilters`],
//! so login changes never touch the registry entries themselves.

use super::types::{Predicate, ProjectFilter, keys};

/// Filters offered to signed-in visitors, in display order
pub const LOGGED_IN_CONTEXT: &[&str] = &[
    keys::FINISHED,
    keys::PROJECTS_WE_LOVE,
    keys::ALL,
    keys::SAVED_PROJECTS,
    keys::CONTRIBUTED_BY_FRIENDS,
    keys::EXPIRING,
    keys::RECENT,
];

/// Filters offered to anonymous visitors, in display order
pub const ANONYMOUS_CONTEXT: &[&str] = &[
    keys::FINISHED,
    keys::PROJECTS_WE_LOVE,
    keys::ALL,
    keys::EXPIRING,
    keys::RECENT,
];

/// Days ahead that count as "expiring"
const EXPIRING_DAYS: i64 = 14;
/// Days back that count as "recent"
const RECENT_DAYS: i64 = 5;

/// Keyed collection of filters and modes
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: Vec<ProjectFilter>,
}

impl FilterRegistry {
    /// Empty registry
    #[must_use]
    pub const fn empty() -> Self {
        Self { filters: Vec::new() }
    }

    /// The catalog's standard filters and modes
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.insert(ProjectFilter::new(keys::ALL_MODES, "All projects", Predicate::None));
        registry.insert(ProjectFilter::new(keys::SUB, "Subscriptions", Predicate::eq("mode", "sub")));
        registry.insert(ProjectFilter::new(keys::NOT_SUB, "One-off projects", Predicate::not_eq("mode", "sub")));
        registry.insert(ProjectFilter::new(
            keys::COVID_19,
            "COVID-19",
            Predicate::Ilike {
                field: "integrations".to_string(),
                term: "COVID-19".to_string(),
            },
        ));

        registry.insert(
            ProjectFilter::new(keys::PROJECTS_WE_LOVE, "Projects we love", Predicate::eq("recommended", "true"))
                .nicename("Projects we love")
                .contextual(),
        );
        registry.insert(
            ProjectFilter::new(keys::ALL, "All", Predicate::None)
                .nicename("Popular")
                .contextual(),
        );
        registry.insert(
            ProjectFilter::new(keys::FINISHED, "Finished", Predicate::None)
                .nicename("Finished projects")
                .contextual(),
        );
        registry.insert(
            ProjectFilter::new(keys::SAVED_PROJECTS, "Saved projects", Predicate::eq("saved_projects", "true"))
                .nicename("Saved projects")
                .contextual(),
        );
        registry.insert(
            ProjectFilter::new(
                keys::CONTRIBUTED_BY_FRIENDS,
                "Backed by friends",
                Predicate::eq("contributed_by_friends", "true"),
            )
            .nicename("Backed by friends")
            .contextual(),
        );
        registry.insert(
            ProjectFilter::new(keys::EXPIRING, "Expiring soon", Predicate::ExpiringWithin { days: EXPIRING_DAYS })
                .nicename("Expiring soon")
                .contextual(),
        );
        registry.insert(
            ProjectFilter::new(keys::RECENT, "Recent", Predicate::OnlineSince { days: RECENT_DAYS })
                .nicename("Recently launched")
                .contextual(),
        );

        registry
    }

    /// Add or replace a filter under its key
    pub fn insert(&mut self, filter: ProjectFilter) {
        match self.filters.iter_mut().find(|f| f.key_name == filter.key_name) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }

    /// Look up a filter by key; `None` for unknown keys
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProjectFilter> {
        self.filters.iter().find(|f| f.key_name == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.key_name.as_str())
    }

    /// Contextual filters allowed by `context`, in the context's order
    #[must_use]
    pub fn contextual<'a>(&'a self, context: &ContextFilters) -> Vec<&'a ProjectFilter> {
        context
            .keys()
            .iter()
            .filter_map(|key| self.get(key))
            .filter(|f| f.is_contextual)
            .collect()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// The subset of filter keys currently offered to the visitor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextFilters {
    keys: Vec<String>,
}

impl ContextFilters {
    #[must_use]
    pub fn new(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Allow-list for the given login state
    #[must_use]
    pub fn for_session(logged_in: bool) -> Self {
        if logged_in {
            Self::new(LOGGED_IN_CONTEXT)
        } else {
            Self::new(ANONYMOUS_CONTEXT)
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.keys.retain(|k| k != key);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_every_key() {
        let registry = FilterRegistry::standard();
        for key in [
            keys::ALL,
            keys::FINISHED,
            keys::PROJECTS_WE_LOVE,
            keys::SAVED_PROJECTS,
            keys::CONTRIBUTED_BY_FRIENDS,
            keys::EXPIRING,
            keys::RECENT,
            keys::ALL_MODES,
            keys::SUB,
            keys::NOT_SUB,
            keys::COVID_19,
        ] {
            assert!(registry.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_unknown_key_is_none() {
        assert!(FilterRegistry::standard().get("trending").is_none());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut registry = FilterRegistry::standard();
        registry.insert(ProjectFilter::new(keys::ALL, "Everything", Predicate::None));

        assert_eq!(registry.get(keys::ALL).unwrap().title, "Everything");
        assert_eq!(registry.keys().filter(|k| *k == keys::ALL).count(), 1);
    }

    #[test]
    fn test_anonymous_context_hides_personal_filters() {
        let registry = FilterRegistry::standard();
        let anonymous = ContextFilters::for_session(false);
        let names: Vec<_> = registry
            .contextual(&anonymous)
            .iter()
            .map(|f| f.key_name.as_str())
            .collect();

        assert_eq!(names, vec!["finished", "projects_we_love", "all", "expiring", "recent"]);
    }

    #[test]
    fn test_logged_in_context_exposes_personal_filters() {
        let context = ContextFilters::for_session(true);
        assert!(context.contains(keys::SAVED_PROJECTS));
        assert!(context.contains(keys::CONTRIBUTED_BY_FRIENDS));
    }

    #[test]
    fn test_context_change_leaves_registry_untouched() {
        let registry = FilterRegistry::standard();
        let before = registry.get(keys::SAVED_PROJECTS).cloned();

        let mut context = ContextFilters::for_session(true);
        context.remove(keys::SAVED_PROJECTS);
        assert!(registry.contextual(&context).iter().all(|f| f.key_name != keys::SAVED_PROJECTS));

        assert_eq!(registry.get(keys::SAVED_PROJECTS).cloned(), before);
    }

    #[test]
    fn test_modes_are_not_contextual() {
        let registry = FilterRegistry::standard();
        let context = ContextFilters::new(&[keys::SUB, keys::ALL]);
        let names: Vec<_> = registry.contextual(&context).iter().map(|f| f.key_name.clone()).collect();
        assert_eq!(names, vec![keys::ALL.to_string()]);
    }
}
