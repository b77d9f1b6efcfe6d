//! Output formatting for CLI display
//!
//! Renders listings as a colored table, a JSON report or CSV rows, plus the
//! one-line formats used for locations, categories and filters.

use crate::filters::ProjectFilter;
use crate::models::{Category, CityState, Project};
use crate::search::Query;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors raised while rendering output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

const CSV_HEADER: [&str; 8] = [
    "project_id",
    "project_name",
    "category",
    "mode",
    "state",
    "location",
    "pledged",
    "progress",
];

/// Everything printed for one search
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport<'a> {
    pub query: &'a Query,
    pub total: u64,
    pub shown: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_found_on_location: Option<u64>,
    pub projects: Vec<&'a Project>,
}

/// `city, UF` or `UF` or `-`
#[must_use]
pub fn project_location(project: &Project) -> String {
    match (&project.city_name, &project.state_acronym) {
        (Some(city), Some(uf)) => format!("{city}, {uf}"),
        (Some(city), None) => city.clone(),
        (None, Some(uf)) => uf.clone(),
        (None, None) => "-".to_string(),
    }
}

/// Format a pledged amount with two decimals
#[must_use]
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

fn cell(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn project_category(project: &Project) -> String {
    project
        .category_name
        .clone()
        .or_else(|| project.category_id.map(|id| format!("#{id}")))
        .unwrap_or_else(|| "-".to_string())
}

/// Render the listing as an aligned table
///
/// In quiet mode only project names are printed, one per line.
#[must_use]
pub fn projects_table(report: &SearchReport<'_>, quiet: bool) -> String {
    let mut out = String::new();
    if quiet {
        for project in &report.projects {
            let _ = writeln!(out, "{}", project.project_name);
        }
        return out;
    }

    let name_width = report
        .projects
        .iter()
        .map(|p| p.project_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Project".len());

    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:>6}  {:<name_width$}  {:<12}  {:<5}  {:<10}  {:>10}  {}",
            "ID", "Project", "Category", "Mode", "State", "Pledged", "Location"
        )
        .bold()
    );
    for project in &report.projects {
        let pledged = format_amount(project.pledged);
        let state = cell(project.state.as_deref());
        let state = if project.open_for_contributions {
            state.green()
        } else {
            state.dimmed()
        };
        let _ = writeln!(
            out,
            "{:>6}  {:<name_width$}  {:<12}  {:<5}  {:<10}  {:>10}  {}",
            project.project_id,
            project.project_name,
            project_category(project),
            cell(project.mode.as_deref()),
            state,
            pledged,
            project_location(project)
        );
    }

    let _ = write!(out, "{}", format!("{} of {} project(s)", report.shown, report.total).cyan());
    if let Some(amount) = report.amount_found_on_location {
        let _ = write!(out, "{}", format!(" ({amount} in the selected city)").cyan());
    }
    out.push('\n');
    out
}

/// Render the full report as pretty JSON
///
/// # Errors
///
/// Returns `OutputError::Json` if serialization fails.
pub fn report_json(report: &SearchReport<'_>) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the listing as CSV with a header row
///
/// # Errors
///
/// Returns `OutputError` if a record cannot be written.
pub fn projects_csv(projects: &[&Project]) -> Result<String, OutputError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for project in projects {
        writer.write_record([
            project.project_id.to_string(),
            project.project_name.clone(),
            project_category(project),
            cell(project.mode.as_deref()).to_string(),
            cell(project.state.as_deref()).to_string(),
            project_location(project),
            format_amount(project.pledged),
            format_amount(project.progress),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// One location line; whole-state entries stand out
#[must_use]
pub fn location_line(location: &CityState, quiet: bool) -> String {
    let label = location.label();
    if quiet {
        label
    } else if location.city.is_none() {
        label.bold().to_string()
    } else {
        format!("  {label}")
    }
}

#[must_use]
pub fn category_line(category: &Category, quiet: bool) -> String {
    match (category.id, quiet) {
        (_, true) => category.name.clone(),
        (Some(id), false) => format!("  {id:>4}  {}", category.name),
        (None, false) => format!("     -  {}", category.name.italic()),
    }
}

/// One filter line: key, heading label, and a marker for the active one
#[must_use]
pub fn filter_line(filter: &ProjectFilter, active: bool, quiet: bool) -> String {
    if quiet {
        return filter.key_name.clone();
    }
    let marker = if active { "*".green().to_string() } else { " ".to_string() };
    format!("{marker} {:<24} {}", filter.key_name, filter.display_name())
}
