//! Command-line interface definitions and parsing
//!
//! Defines the `project-explore` command line with `clap` and converts the
//! parsed arguments into explore parameters.
//!
//! # Commands
//!
//! - **search**: run one explore search over a data directory
//! - **locations**: look up cities, grouped by state
//! - **categories**: list the category cache, sentinel first
//! - **filters**: list the contextual filters for a session
//!
//! # Examples
//!
//! ```
//! use project_explore::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from_args(["project-explore", "--data", "fixtures", "search", "--text", "garden"]);
//! if let Commands::Search(args) = &cli.command {
//!     let params = args.explore_params();
//!     assert_eq!(params.search_param.as_deref(), Some("garden"));
//! }
//! ```

use crate::models::{City, CityState, State};
use crate::search::{ExploreParams, Mode};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Output format of listings
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Colored table
    #[default]
    Table,
    /// JSON report
    Json,
    /// CSV rows
    Csv,
}

/// Campaign family
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    #[value(name = "all_modes")]
    AllModes,
    #[value(name = "sub")]
    Sub,
    #[value(name = "not_sub")]
    NotSub,
    #[value(name = "covid_19")]
    Covid19,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AllModes => Self::AllModes,
            ModeArg::Sub => Self::Sub,
            ModeArg::NotSub => Self::NotSub,
            ModeArg::Covid19 => Self::Covid19,
        }
    }
}

/// Arguments of the search command
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Campaign family
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Filter key (e.g. all, finished, recent)
    #[arg(short = 'f', long = "filter", value_name = "KEY")]
    pub filter: Option<String>,

    /// Category id
    #[arg(short = 'c', long = "category", value_name = "ID")]
    pub category: Option<i64>,

    /// State acronym (e.g. SP)
    #[arg(short = 's', long = "state", value_name = "UF")]
    pub state: Option<String>,

    /// Full state name, used for display
    #[arg(long = "state-name", value_name = "NAME", requires = "state")]
    pub state_name: Option<String>,

    /// City within the state
    #[arg(long = "city", value_name = "NAME", requires = "state")]
    pub city: Option<String>,

    /// Free-text search
    #[arg(short = 't', long = "text", value_name = "TEXT")]
    pub text: Option<String>,

    /// Number of pages to load
    #[arg(short = 'p', long = "pages", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Search as a logged-in visitor
    #[arg(long = "logged-in")]
    pub logged_in: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SearchArgs {
    /// Selected geography, if a state was given
    #[must_use]
    pub fn city_state(&self) -> Option<CityState> {
        let acronym = self.state.as_deref()?;
        let state_name = self.state_name.as_deref().unwrap_or(acronym);
        let state = State::new(acronym, state_name);

        Some(match &self.city {
            Some(city) => CityState::city(state, City::new(city.as_str(), acronym, state_name)),
            None => CityState::state(state),
        })
    }

    /// Convert into explore parameters
    #[must_use]
    pub fn explore_params(&self) -> ExploreParams {
        ExploreParams {
            search_param: self.text.clone(),
            mode: self.mode.map(Mode::from),
            city_state: self.city_state(),
            category_id: self.category,
            filter: self.filter.clone(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an explore search and print the listing
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// Look up cities by name, grouped by state
    #[command(visible_alias = "l")]
    Locations {
        /// Part of a city name
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// List categories
    Categories,

    /// List the filters offered to a visitor
    Filters {
        /// Show the logged-in selection
        #[arg(long = "logged-in")]
        logged_in: bool,

        /// Campaign family
        #[arg(short = 'm', long = "mode", value_enum)]
        mode: Option<ModeArg>,
    },
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "project-explore")]
#[command(about = "Explore a crowdfunding project catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding projects.json, categories.json and cities.json
    #[arg(short = 'd', long = "data", value_name = "DIR", global = true, default_value = ".")]
    pub data: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors and print bare results
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse from an explicit argument list
    #[must_use]
    pub fn parse_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::parse_from(args)
    }

    /// Default log directive for the chosen verbosity
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.quiet {
            "project_explore=error"
        } else if self.verbose {
            "project_explore=debug"
        } else {
            "project_explore=info"
        }
    }

    /// Log filter to install: `rust_log` when set, else [`Self::log_directive`]
    #[must_use]
    pub fn log_filter(&self, rust_log: Option<&str>) -> String {
        match rust_log.map(str::trim) {
            Some(filter) if !filter.is_empty() => filter.to_string(),
            _ => self.log_directive().to_string(),
        }
    }
}
