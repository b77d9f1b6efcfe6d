//! Explore search
//!
//! The controller ([`ProjectsExplorer`]) plus the state it owns and the
//! seams it is injected with.
//!
//! # Examples
//!
//! ```no_run
//! use project_explore::search::{ExploreParams, ProjectsExplorer, StaticSession};
//! use project_explore::source::MemoryBackend;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(MemoryBackend::from_dir("data")?);
//! let mut explorer = ProjectsExplorer::builder()
//!     .catalog(backend.clone())
//!     .category_source(backend.clone())
//!     .cities(backend)
//!     .session(Arc::new(StaticSession::new(false)))
//!     .params(ExploreParams::new().search_param("garden"))
//!     .build()?;
//!
//! explorer.start().await?;
//! for project in explorer.projects() {
//!     println!("{}", project.project_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod explorer;
pub mod state;
pub mod traits;

pub use error::SearchError;
pub use explorer::{
    ACTIVE_ORDER, CompletedSearch, FINISHED_ORDER, PendingSearch, ProjectsExplorer, ProjectsExplorerBuilder,
    SearchPhase, ViewKind,
};
pub use state::{DEFAULT_FILTER, ExploreParams, Mode, Query, SearchState};
pub use traits::{NoRedraw, QueryObserver, Redraw, RedrawCounter, Session, StaticSession};
