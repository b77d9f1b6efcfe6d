//! Geographic search
//!
//! Looks cities up in the city directory and regroups the flat result by
//! state: each state contributes a "whole state" entry followed by one entry
//! per city found in it. States appear in the order they are first seen in
//! the directory result, not alphabetically.

use crate::models::{City, CityState, State};
use crate::params::{Direction, FilterBuilder};
use crate::source::{CitySource, SourceError};
use std::future::Future;
use std::time::Duration;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Strip diacritics: `São Paulo` → `Sao Paulo`
#[must_use]
pub fn normalize(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Cities whose search index contains `text`, ordered by name
///
/// # Errors
///
/// Propagates the directory's `SourceError`.
pub async fn search_cities(source: &dyn CitySource, text: &str) -> Result<Vec<City>, SourceError> {
    let params = FilterBuilder::new()
        .ilike("search_index", &normalize(text))
        .order(&[("name", Direction::Asc)])
        .parameters();
    source.fetch_cities(&params).await
}

/// Search the directory and group the hits by state
///
/// # Errors
///
/// Propagates the directory's `SourceError`.
pub async fn search_cities_grouped_by_state(
    source: &dyn CitySource,
    text: &str,
) -> Result<Vec<CityState>, SourceError> {
    let cities = search_cities(source, text).await?;
    tracing::debug!(query = text, hits = cities.len(), "city directory search");
    Ok(group_by_state(cities))
}

/// Regroup a flat city list into state entries followed by their cities
///
/// States keep first-seen order. Within a state, later cities are placed
/// ahead of earlier ones, and the state's acronym is taken from the city
/// listed first.
#[must_use]
pub fn group_by_state(cities: Vec<City>) -> Vec<CityState> {
    let mut groups: Vec<(String, Vec<City>)> = Vec::new();
    for city in cities {
        let state_name = city.state_name.clone().unwrap_or_default();
        match groups.iter_mut().find(|(name, _)| *name == state_name) {
            Some((_, members)) => members.insert(0, city),
            None => groups.push((state_name, vec![city])),
        }
    }

    let mut list = Vec::new();
    for (state_name, members) in groups {
        let acronym = members
            .first()
            .and_then(|c| c.acronym.clone())
            .unwrap_or_default();
        let state = State::new(acronym, state_name);

        list.push(CityState::state(state.clone()));
        list.extend(members.into_iter().map(|city| CityState::city(state.clone(), city)));
    }
    list
}

/// Await `work`, calling `on_slow` if it is still pending after `delay`
///
/// Fast responses never trigger `on_slow`, which keeps a loading indicator
/// from flickering.
pub async fn await_with_loading_flag<F, T>(work: F, delay: Duration, on_slow: impl FnOnce()) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(work);
    tokio::select! {
        biased;
        output = &mut work => output,
        () = tokio::time::sleep(delay) => {
            on_slow();
            work.await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCities;

    fn city(name: &str, acronym: &str, state: &str) -> City {
        City::new(name, acronym, state)
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("São Paulo"), "Sao Paulo");
        assert_eq!(normalize("Açaí"), "Acai");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn test_group_keeps_first_seen_state_order() {
        let grouped = group_by_state(vec![
            city("Recife", "PE", "Pernambuco"),
            city("Campinas", "SP", "São Paulo"),
            city("Olinda", "PE", "Pernambuco"),
        ]);

        let labels: Vec<_> = grouped.iter().map(CityState::label).collect();
        assert_eq!(labels, vec!["Pernambuco", "Olinda, PE", "Recife, PE", "São Paulo", "Campinas, SP"]);
    }

    #[test]
    fn test_cities_within_state_are_most_recent_first() {
        let grouped = group_by_state(vec![
            city("Campinas", "SP", "São Paulo"),
            city("Santos", "SP", "São Paulo"),
            city("Sorocaba", "SP", "São Paulo"),
        ]);

        let labels: Vec<_> = grouped.iter().map(CityState::label).collect();
        assert_eq!(labels, vec!["São Paulo", "Sorocaba, SP", "Santos, SP", "Campinas, SP"]);
    }

    #[test]
    fn test_state_entry_precedes_its_cities() {
        let grouped = group_by_state(vec![city("Campinas", "SP", "São Paulo"), city("Santos", "SP", "São Paulo")]);

        assert!(grouped[0].city.is_none());
        assert_eq!(grouped[0].state, State::new("SP", "São Paulo"));
        assert!(grouped[1..].iter().all(|cs| cs.city.is_some()));
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_state(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_search_normalizes_input() {
        let cities = ScriptedCities::new(vec![city("São Paulo", "SP", "São Paulo")]);
        let found = search_cities_grouped_by_state(&cities, "São").await.unwrap();

        assert_eq!(found.len(), 2);
        let params = cities.last_params().unwrap();
        assert_eq!(params.get("search_index"), Some("ilike.*Sao*"));
        assert_eq!(params.get("order"), Some("name.asc"));
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let cities = ScriptedCities::failing();
        assert!(search_cities_grouped_by_state(&cities, "x").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_work_never_flags_loading() {
        let mut flagged = false;
        let value = await_with_loading_flag(
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                7
            },
            Duration::from_millis(100),
            || flagged = true,
        )
        .await;

        assert_eq!(value, 7);
        assert!(!flagged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_flags_loading() {
        let mut flagged = false;
        let value = await_with_loading_flag(
            async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                "done"
            },
            Duration::from_millis(100),
            || flagged = true,
        )
        .await;

        assert_eq!(value, "done");
        assert!(flagged);
    }
}
