//! REST query parameters
//!
//! Builds the flat `field=operator.value` parameter sets understood by the
//! catalog's PostgREST-style endpoints. The explore flow composes several of
//! these sets by overlaying them (later keys win), the same way the listing
//! endpoint receives them.
//!
//! ```
//! use project_explore::params::{Direction, FilterBuilder};
//!
//! let params = FilterBuilder::new()
//!     .eq("category_id", 7)
//!     .order(&[("pledged", Direction::Desc)])
//!     .parameters();
//!
//! assert_eq!(params.get("category_id"), Some("eq.7"));
//! assert_eq!(params.get("order"), Some("pledged.desc"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key holding the ordering clause
pub const ORDER_KEY: &str = "order";
/// Key holding the projected column list
pub const SELECT_KEY: &str = "select";
/// Key holding a disjunction of predicates
pub const OR_KEY: &str = "or";

/// Sort direction of one ordering term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// A flat set of query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    entries: BTreeMap<String, String>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw parameter, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of `self`; keys present in both take `other`'s value
    pub fn extend(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Owned variant of [`QueryParams::extend`]
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.extend(other);
        self
    }

    /// Parsed ordering terms, in priority order
    ///
    /// Terms that do not parse are skipped.
    #[must_use]
    pub fn ordering(&self) -> Vec<(String, Direction)> {
        self.get(ORDER_KEY)
            .map(|clause| {
                clause
                    .split(',')
                    .filter_map(|term| {
                        let (field, dir) = term.rsplit_once('.')?;
                        Some((field.to_string(), dir.parse().ok()?))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render as `key=value&key=value` (keys sorted)
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Fluent builder for [`QueryParams`]
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    params: QueryParams,
}

impl FilterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `field = value`
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.params.insert(field, format!("eq.{value}"));
        self
    }

    /// `field <> value`
    #[must_use]
    pub fn not_eq(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.params.insert(field, format!("not.eq.{value}"));
        self
    }

    /// Case-insensitive partial match
    #[must_use]
    pub fn ilike(mut self, field: &str, term: &str) -> Self {
        self.params.insert(field, format!("ilike.*{term}*"));
        self
    }

    #[must_use]
    pub fn lte(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.params.insert(field, format!("lte.{value}"));
        self
    }

    #[must_use]
    pub fn gte(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.params.insert(field, format!("gte.{value}"));
        self
    }

    /// `field is value` (`null`, `true`, `false`)
    #[must_use]
    pub fn is(mut self, field: &str, value: &str) -> Self {
        self.params.insert(field, format!("is.{value}"));
        self
    }

    /// Full-text match of `term` against any of `fields`
    #[must_use]
    pub fn text_search(mut self, fields: &[&str], term: &str) -> Self {
        let term = quote_term(term);
        let clauses = fields
            .iter()
            .map(|field| format!("{field}.plfts.{term}"))
            .collect::<Vec<_>>()
            .join(",");
        self.params.insert(OR_KEY, format!("({clauses})"));
        self
    }

    #[must_use]
    pub fn order(mut self, terms: &[(&str, Direction)]) -> Self {
        let clause = terms
            .iter()
            .map(|(field, dir)| format!("{field}.{dir}"))
            .collect::<Vec<_>>()
            .join(",");
        self.params.insert(ORDER_KEY, clause);
        self
    }

    #[must_use]
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.params.insert(SELECT_KEY, fields.join(","));
        self
    }

    #[must_use]
    pub fn parameters(self) -> QueryParams {
        self.params
    }
}

// Reserved characters inside an `or=(...)` list must be quoted; inside the
// quotes `\` and `"` are backslash-escaped.
fn quote_term(term: &str) -> String {
    if term.contains([',', '(', ')', ' ', '.', '"', '\\']) {
        format!("\"{}\"", term.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        term.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_operators() {
        let params = FilterBuilder::new()
            .eq("state_acronym", "SP")
            .not_eq("city_name", "Campinas")
            .ilike("search_index", "camp")
            .is("expires_at", "null")
            .parameters();

        assert_eq!(params.get("state_acronym"), Some("eq.SP"));
        assert_eq!(params.get("city_name"), Some("not.eq.Campinas"));
        assert_eq!(params.get("search_index"), Some("ilike.*camp*"));
        assert_eq!(params.get("expires_at"), Some("is.null"));
    }

    #[test]
    fn test_extend_overwrites_later_keys() {
        let mut base = FilterBuilder::new().eq("a", 1).eq("b", 2).parameters();
        base.extend(&FilterBuilder::new().eq("b", 3).parameters());

        assert_eq!(base.get("a"), Some("eq.1"));
        assert_eq!(base.get("b"), Some("eq.3"));
    }

    #[test]
    fn test_ordering_round_trip() {
        let params = FilterBuilder::new()
            .order(&[
                ("state_order", Direction::Asc),
                ("state", Direction::Desc),
                ("pledged", Direction::Desc),
            ])
            .parameters();

        assert_eq!(params.get(ORDER_KEY), Some("state_order.asc,state.desc,pledged.desc"));
        assert_eq!(
            params.ordering(),
            vec![
                ("state_order".to_string(), Direction::Asc),
                ("state".to_string(), Direction::Desc),
                ("pledged".to_string(), Direction::Desc),
            ]
        );
    }

    #[test]
    fn test_text_search_quotes_phrases() {
        let params = FilterBuilder::new()
            .text_search(&["full_text_index", "project_name"], "solar panel")
            .parameters();

        assert_eq!(
            params.get(OR_KEY),
            Some(r#"(full_text_index.plfts."solar panel",project_name.plfts."solar panel")"#)
        );
    }

    #[test]
    fn test_text_search_escapes_backslashes() {
        let params = FilterBuilder::new()
            .text_search(&["full_text_index", "project_name"], r"solar c:\")
            .parameters();

        assert_eq!(
            params.get(OR_KEY),
            Some(r#"(full_text_index.plfts."solar c:\\",project_name.plfts."solar c:\\")"#)
        );
    }

    #[test]
    fn test_text_search_escapes_quotes() {
        let params = FilterBuilder::new()
            .text_search(&["project_name"], r#"say "hi""#)
            .parameters();
        assert_eq!(params.get(OR_KEY), Some(r#"(project_name.plfts."say \"hi\"")"#));
    }

    #[test]
    fn test_query_string_is_sorted() {
        let params: QueryParams = [("b", "eq.2"), ("a", "eq.1")].into_iter().collect();
        assert_eq!(params.to_query_string(), "a=eq.1&b=eq.2");
    }
}
