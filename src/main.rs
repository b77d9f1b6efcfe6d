//! project-explore CLI entry point
//!
//! Runs explore searches against a directory of JSON fixtures
//! (`projects.json`, `categories.json`, `cities.json`).
//!
//! # Usage
//!
//! ```bash
//! # Default listing (projects we love, 9 per page)
//! project-explore --data ./catalog search
//!
//! # Campinas first, then the rest of São Paulo, two pages, as JSON
//! project-explore -d ./catalog search --state SP --state-name "São Paulo" \
//!     --city Campinas --filter all --pages 2 --format json
//!
//! # City lookup, categories, filters offered to a logged-in visitor
//! project-explore -d ./catalog locations camp
//! project-explore -d ./catalog categories
//! project-explore filters --logged-in --mode sub
//! ```
//!
//! # Logging
//!
//! Logs go to stderr. A non-empty `RUST_LOG` replaces the `-v`/`-q` level.

use project_explore::{
    ExploreError,
    cli::{Cli, Commands, OutputFormat, SearchArgs},
    config::ExploreConfig,
    output::{self, SearchReport},
    search::{Mode, ProjectsExplorer, ProjectsExplorerBuilder, StaticSession},
    source::MemoryBackend,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, ExploreError>;

fn init_tracing(cli: &Cli) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(cli.log_filter(rust_log.as_deref()))
        .map_err(|e| ExploreError::InvalidInput(format!("log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ExploreConfig> {
    let config = match &cli.config {
        Some(path) => ExploreConfig::load_from(path)?,
        None => ExploreConfig::load()?,
    };
    Ok(config)
}

/// Explorer wired to the fixture backend
fn explorer_for(backend: &Arc<MemoryBackend>, config: &ExploreConfig, logged_in: bool) -> ProjectsExplorerBuilder {
    ProjectsExplorer::builder()
        .catalog(Arc::clone(backend) as _)
        .category_source(Arc::clone(backend) as _)
        .cities(Arc::clone(backend) as _)
        .session(Arc::new(StaticSession::new(logged_in)))
        .config(config.clone())
}

async fn run_search(backend: &Arc<MemoryBackend>, config: &ExploreConfig, args: &SearchArgs, quiet: bool) -> Result<()> {
    let mut explorer = explorer_for(backend, config, args.logged_in)
        .params(args.explore_params())
        .build()?;
    explorer.start().await?;

    if let Some(id) = explorer.category_id()
        && explorer.category().id != Some(id)
    {
        tracing::warn!(id, "unknown category, listing is likely empty");
    }

    for _ in 1..args.pages {
        if explorer.projects_view().is_last_page() {
            break;
        }
        explorer.next_page().await?;
    }

    let projects = explorer.projects();
    let city_selected = explorer.city_state().and_then(|cs| cs.city_name()).is_some();
    let report = SearchReport {
        query: explorer.last_query(),
        total: explorer.projects_view().total(),
        shown: projects.len(),
        amount_found_on_location: city_selected.then(|| explorer.amount_found_on_location()),
        projects,
    };

    match args.format {
        OutputFormat::Table => print!("{}", output::projects_table(&report, quiet)),
        OutputFormat::Json => println!("{}", output::report_json(&report)?),
        OutputFormat::Csv => print!("{}", output::projects_csv(&report.projects)?),
    }
    Ok(())
}

async fn run_locations(backend: &Arc<MemoryBackend>, config: &ExploreConfig, text: &str, quiet: bool) -> Result<()> {
    let mut explorer = explorer_for(backend, config, false).build()?;
    explorer.search_locations(text).await?;

    if explorer.found_locations().is_empty() && !quiet {
        println!("No locations match '{text}'");
    }
    for location in explorer.found_locations() {
        println!("{}", output::location_line(location, quiet));
    }
    Ok(())
}

async fn run_categories(backend: &Arc<MemoryBackend>, config: &ExploreConfig, quiet: bool) -> Result<()> {
    let explorer = explorer_for(backend, config, false).build()?;
    explorer.category_cache().load(backend.as_ref()).await?;

    for category in explorer.categories() {
        println!("{}", output::category_line(&category, quiet));
    }
    Ok(())
}

fn run_filters(
    backend: &Arc<MemoryBackend>,
    config: &ExploreConfig,
    logged_in: bool,
    mode: Option<Mode>,
    quiet: bool,
) -> Result<()> {
    let mut explorer = explorer_for(backend, config, logged_in).build()?;
    if let Some(mode) = mode {
        explorer.set_mode(mode);
    }

    for filter in explorer.filters() {
        let active = filter.key_name == explorer.filter();
        println!("{}", output::filter_line(filter, active, quiet));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(&cli)?;

    let config = load_config(&cli)?;
    let backend = Arc::new(MemoryBackend::from_dir(&cli.data)?);
    tracing::debug!(data = %cli.data.display(), projects = backend.project_count(), "catalog loaded");

    match &cli.command {
        Commands::Search(args) => run_search(&backend, &config, args, cli.quiet).await,
        Commands::Locations { text } => run_locations(&backend, &config, text, cli.quiet).await,
        Commands::Categories => run_categories(&backend, &config, cli.quiet).await,
        Commands::Filters { logged_in, mode } => {
            run_filters(&backend, &config, *logged_in, mode.map(Into::into), cli.quiet)
        }
    }
}
