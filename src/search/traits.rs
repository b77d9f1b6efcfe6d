//! Seams between the explore controller and its host
//!
//! - [`QueryObserver`]: receives every distinct published [`Query`]
//! - [`Redraw`]: fire-and-forget "state changed, re-render" signal
//! - [`Session`]: read-only view of the visitor's login state
//!
//! All three are injected at construction instead of being process-wide
//! singletons, so a controller can be exercised in isolation.

use super::error::SearchError;
use super::state::Query;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Subscriber to query changes
pub trait QueryObserver: Send + Sync {
    /// A query different from the previously published one
    fn next(&self, query: &Query);

    /// A search failed to load its first page
    fn error(&self, _error: &SearchError) {}
}

/// Re-render signal; may be called redundantly
pub trait Redraw: Send + Sync {
    fn redraw(&self);
}

/// Redraw sink that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRedraw;

impl Redraw for NoRedraw {
    fn redraw(&self) {}
}

/// Redraw sink that counts calls
#[derive(Debug, Default)]
pub struct RedrawCounter {
    count: AtomicUsize,
}

impl RedrawCounter {
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Redraw for RedrawCounter {
    fn redraw(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Login state of the current visitor
pub trait Session: Send + Sync {
    fn is_logged_in(&self) -> bool;
}

/// Session whose login state is set by the host
#[derive(Debug, Default)]
pub struct StaticSession {
    logged_in: AtomicBool,
}

impl StaticSession {
    #[must_use]
    pub const fn new(logged_in: bool) -> Self {
        Self {
            logged_in: AtomicBool::new(logged_in),
        }
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
    }
}

impl Session for StaticSession {
    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_session_toggles() {
        let session = StaticSession::new(false);
        assert!(!session.is_logged_in());
        session.set_logged_in(true);
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_redraw_counter() {
        let counter = RedrawCounter::default();
        counter.redraw();
        counter.redraw();
        assert_eq!(counter.count(), 2);
    }
}
