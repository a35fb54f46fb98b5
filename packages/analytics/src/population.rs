//! Population enrichment.

use std::collections::HashMap;

use covid_tracker_series_models::Area;

/// Area key to population, built once per load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationIndex {
    by_key: HashMap<String, u64>,
}

impl PopulationIndex {
    /// Population for an area key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.by_key.get(key).copied()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the index has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Sets `population` on every record of `area` when its key is known.
    /// Returns the area and whether it matched.
    #[must_use]
    pub fn enrich(&self, mut area: Area) -> (Area, bool) {
        let Some(population) = self.get(&area.key) else {
            return (area, false);
        };
        for day in &mut area.values {
            day.population = Some(population);
        }
        (area, true)
    }
}

/// Later entries replace earlier ones with the same key.
impl FromIterator<(String, u64)> for PopulationIndex {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut by_key = HashMap::new();
        for (key, population) in iter {
            by_key.insert(key, population);
        }
        Self { by_key }
    }
}

/// How many areas the join matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Areas that received a population.
    pub matched: usize,
    /// Areas left without one.
    pub unmatched: usize,
}

impl JoinReport {
    /// Counts one join outcome.
    pub const fn record(&mut self, matched: bool) {
        if matched {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
    }
}

/// Enriches every area, leaving unmatched areas untouched.
#[must_use]
pub fn join_population(
    areas: impl IntoIterator<Item = Area>,
    index: &PopulationIndex,
) -> (Vec<Area>, JoinReport) {
    let mut report = JoinReport::default();
    let areas = areas
        .into_iter()
        .map(|area| {
            let (area, matched) = index.enrich(area);
            report.record(matched);
            area
        })
        .collect();

    log::debug!(
        "population join: {} matched, {} unmatched",
        report.matched,
        report.unmatched
    );

    (areas, report)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use covid_tracker_series_models::{AreaKind, DailyRecord};

    use super::*;

    fn area(key: &str) -> Area {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        Area::new(
            key,
            AreaKind::World,
            start
                .iter_days()
                .take(3)
                .map(|d| DailyRecord::new(d, 1, 0))
                .collect(),
        )
    }

    #[test]
    fn sets_population_on_every_matching_day() {
        let index: PopulationIndex = [("France".to_owned(), 1000)].into_iter().collect();
        let (areas, report) = join_population([area("France"), area("Spain")], &index);

        assert!(areas[0].values.iter().all(|d| d.population == Some(1000)));
        assert!(areas[1].values.iter().all(|d| d.population.is_none()));
        assert_eq!(
            report,
            JoinReport {
                matched: 1,
                unmatched: 1
            }
        );
    }

    #[test]
    fn last_duplicate_key_wins() {
        let index: PopulationIndex = [("France".to_owned(), 1), ("France".to_owned(), 2)]
            .into_iter()
            .collect();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("France"), Some(2));
    }

    #[test]
    fn empty_index_matches_nothing() {
        let index = PopulationIndex::default();
        assert!(index.is_empty());
        let (area, matched) = index.enrich(area("France"));
        assert!(!matched);
        assert!(area.values.iter().all(|d| d.population.is_none()));
    }
}
