//! project-explore - search, filter and paginate a crowdfunding catalog
//!
//! This library composes a visitor's search intent (mode, filter, category,
//! city or state, free text) into catalog query parameters and pages through
//! the result, splitting city searches into "this city" followed by "the rest
//! of the state".

use thiserror::Error;

pub mod categories;
pub mod cli;
pub mod config;
pub mod filters;
pub mod geo;
pub mod models;
pub mod output;
pub mod pagination;
pub mod params;
pub mod search;
pub mod source;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum ExploreError {
    /// Data source error
    #[error("Source error: {0}")]
    SourceError(#[from] source::SourceError),
    /// Category lookup error
    #[error("Category error: {0}")]
    CategoryError(#[from] categories::CategoryError),
    /// Listing error
    #[error("Pagination error: {0}")]
    PaginationError(#[from] pagination::PaginationError),
    /// Search error
    #[error("Search error: {0}")]
    SearchError(#[from] search::SearchError),
    /// Output rendering error
    #[error("Output error: {0}")]
    OutputError(#[from] output::OutputError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
