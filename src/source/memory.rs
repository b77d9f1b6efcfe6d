//! In-memory backend
//!
//! Serves projects, categories and cities from JSON rows held in memory,
//! interpreting the same PostgREST-style parameters the REST endpoints
//! receive. Used by the command-line front end (rows loaded from a data
//! directory) and by the integration tests.
//!
//! Supported operators: `eq`, `lt`, `lte`, `gt`, `gte`, `ilike` (with `*`
//! wildcards), `is` (`null`/`true`/`false`), `plfts` inside `or=(...)`, and
//! a `not.` prefix on any of them. `order=` is honoured; `select=` is
//! accepted but rows are always returned whole.

use super::error::SourceError;
use super::{CategorySource, CitySource, Page, PageRequest, ProjectCatalog, ProjectModel};
use crate::geo::normalize;
use crate::models::{Category, City, Project};
use crate::params::{Direction, OR_KEY, ORDER_KEY, QueryParams, SELECT_KEY};
use async_trait::async_trait;
use regex::RegexBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

pub const PROJECTS_FILE: &str = "projects.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const CITIES_FILE: &str = "cities.json";

/// Rows backing every endpoint, held as raw JSON
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    projects: Vec<Value>,
    categories: Vec<Value>,
    cities: Vec<Value>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `projects.json`, `categories.json` and `cities.json` from `dir`
    ///
    /// Missing files yield empty tables.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if a file cannot be read or is not a JSON array.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        Ok(Self {
            projects: read_rows(&dir.join(PROJECTS_FILE))?,
            categories: read_rows(&dir.join(CATEGORIES_FILE))?,
            cities: read_rows(&dir.join(CITIES_FILE))?,
        })
    }

    /// Replace the project rows
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Decode` if a row cannot be serialized.
    pub fn with_projects<T: Serialize>(mut self, rows: &[T]) -> Result<Self, SourceError> {
        self.projects = to_values(rows)?;
        Ok(self)
    }

    /// Replace the category rows
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Decode` if a row cannot be serialized.
    pub fn with_categories<T: Serialize>(mut self, rows: &[T]) -> Result<Self, SourceError> {
        self.categories = to_values(rows)?;
        Ok(self)
    }

    /// Replace the city rows
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Decode` if a row cannot be serialized.
    pub fn with_cities<T: Serialize>(mut self, rows: &[T]) -> Result<Self, SourceError> {
        self.cities = to_values(rows)?;
        Ok(self)
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    fn model_rows(&self, model: ProjectModel) -> impl Iterator<Item = &Value> {
        self.projects.iter().filter(move |row| match model {
            ProjectModel::Active => true,
            ProjectModel::Finished => row.get("state_order").and_then(Value::as_str) == Some("finished"),
        })
    }
}

#[async_trait]
impl ProjectCatalog for MemoryBackend {
    async fn fetch_projects(&self, model: ProjectModel, request: &PageRequest) -> Result<Page<Project>, SourceError> {
        tracing::trace!(%model, params = %request.params, page = request.page, "memory fetch");
        let rows = select_rows(self.model_rows(model), &request.params)?;
        page_of(&rows, request)
    }
}

#[async_trait]
impl CategorySource for MemoryBackend {
    async fn fetch_categories(&self, request: &PageRequest) -> Result<Vec<Category>, SourceError> {
        let rows = select_rows(self.categories.iter(), &request.params)?;
        Ok(page_of(&rows, request)?.items)
    }
}

#[async_trait]
impl CitySource for MemoryBackend {
    async fn fetch_cities(&self, params: &QueryParams) -> Result<Vec<City>, SourceError> {
        select_rows(self.cities.iter(), params)?
            .into_iter()
            .map(|row| serde_json::from_value(row.clone()).map_err(SourceError::from))
            .collect()
    }
}

fn read_rows(path: &Path) -> Result<Vec<Value>, SourceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Array(rows) => Ok(rows),
        _ => Err(SourceError::Request(format!(
            "{} must contain a JSON array",
            path.display()
        ))),
    }
}

fn to_values<T: Serialize>(rows: &[T]) -> Result<Vec<Value>, SourceError> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(SourceError::from))
        .collect()
}

fn page_of<T: DeserializeOwned>(rows: &[&Value], request: &PageRequest) -> Result<Page<T>, SourceError> {
    let items = rows
        .iter()
        .skip(request.offset())
        .take(request.page_size as usize)
        .map(|row| serde_json::from_value((*row).clone()).map_err(SourceError::from))
        .collect::<Result<Vec<T>, _>>()?;
    let total = request.exact_count.then_some(rows.len() as u64);
    Ok(Page::new(items, total))
}

/// Filter and order rows according to `params`
fn select_rows<'a>(
    rows: impl Iterator<Item = &'a Value>,
    params: &QueryParams,
) -> Result<Vec<&'a Value>, SourceError> {
    let mut selected = Vec::new();
    for row in rows {
        if row_matches(row, params)? {
            selected.push(row);
        }
    }

    let ordering = params.ordering();
    if !ordering.is_empty() {
        selected.sort_by(|a, b| {
            ordering
                .iter()
                .map(|(field, dir)| compare_fields(a.get(field), b.get(field), *dir))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
    Ok(selected)
}

fn row_matches(row: &Value, params: &QueryParams) -> Result<bool, SourceError> {
    for (key, expr) in params.iter() {
        let matched = match key {
            ORDER_KEY | SELECT_KEY => true,
            OR_KEY => matches_any(row, expr)?,
            field => matches_expr(row, field, expr)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn invalid(key: &str, value: &str) -> SourceError {
    SourceError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// `(field.op.value,field.op.value)`
fn matches_any(row: &Value, expr: &str) -> Result<bool, SourceError> {
    let inner = expr
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| invalid(OR_KEY, expr))?;

    for clause in split_top_level(inner) {
        let (field, condition) = clause.split_once('.').ok_or_else(|| invalid(OR_KEY, clause))?;
        if matches_expr(row, field, condition)? {
            return Ok(true);
        }
    }
    Ok(false)
}

// Split on commas that are not inside double quotes.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '\\' if quoted => escaped = !escaped,
            '"' if !escaped => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    parts.push(&list[start..]);
    parts
}

fn unquote(operand: &str) -> String {
    let Some(inner) = operand.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return operand.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

fn matches_expr(row: &Value, field: &str, expr: &str) -> Result<bool, SourceError> {
    let (negated, expr) = expr
        .strip_prefix("not.")
        .map_or((false, expr), |rest| (true, rest));
    let (op, operand) = expr.split_once('.').ok_or_else(|| invalid(field, expr))?;
    let operand = unquote(operand);
    let value = row.get(field).unwrap_or(&Value::Null);

    if op == "is" {
        let result = match operand.as_str() {
            "null" => value.is_null(),
            "true" => value.as_bool() == Some(true),
            "false" => value.as_bool() == Some(false),
            _ => return Err(invalid(field, expr)),
        };
        return Ok(result != negated);
    }

    // SQL semantics: comparisons against NULL never match, negated or not.
    if value.is_null() {
        return Ok(false);
    }

    let result = match op {
        "eq" => compare_operand(value, &operand) == Some(Ordering::Equal),
        "lt" => compare_operand(value, &operand) == Some(Ordering::Less),
        "lte" => matches!(compare_operand(value, &operand), Some(Ordering::Less | Ordering::Equal)),
        "gt" => compare_operand(value, &operand) == Some(Ordering::Greater),
        "gte" => matches!(compare_operand(value, &operand), Some(Ordering::Greater | Ordering::Equal)),
        "ilike" => ilike(value, &operand).map_err(|_| invalid(field, expr))?,
        "plfts" => full_text(value, &operand),
        _ => return Err(invalid(field, expr)),
    };
    Ok(result != negated)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_operand(value: &Value, operand: &str) -> Option<Ordering> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64()?.partial_cmp(&operand.parse::<f64>().ok()?),
        Value::Bool(b) => Some(b.cmp(&operand.parse::<bool>().ok()?)),
        Value::String(s) => Some(s.as_str().cmp(operand)),
        other => Some(other.to_string().as_str().cmp(operand)),
    }
}

fn ilike(value: &Value, pattern: &str) -> Result<bool, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let re = RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()?;
    Ok(re.is_match(&value_text(value)))
}

fn full_text(value: &Value, term: &str) -> bool {
    let text = normalize(&value_text(value)).to_lowercase();
    let term = normalize(term).to_lowercase();
    term.split_whitespace().all(|word| text.contains(word))
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        // nulls sort last in both directions
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}
