//! Project filter registry
//!
//! Filters are named predicates applied inside a mode ("projects we love",
//! "expiring", ...). Modes (`all_modes`, `sub`, `not_sub`, `covid_19`) live
//! in the same registry because they contribute query parameters the same
//! way.
//!
//! # Examples
//!
//! ```
//! use project_explore::filters::{ContextFilters, FilterRegistry, keys};
//!
//! let registry = FilterRegistry::standard();
//! assert!(registry.get(keys::RECENT).is_some());
//!
//! let anonymous = ContextFilters::for_session(false);
//! assert!(!anonymous.contains(keys::SAVED_PROJECTS));
//! ```

pub mod registry;
pub mod types;

pub use registry::{ANONYMOUS_CONTEXT, ContextFilters, FilterRegistry, LOGGED_IN_CONTEXT};
pub use types::{Predicate, ProjectFilter, keys};
