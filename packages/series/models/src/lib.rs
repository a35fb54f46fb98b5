#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-area daily time series types.
//!
//! Every tabular source (NYT long-format US tables, JHU wide-format world
//! tables) is normalized into [`Area`] values holding ordered
//! [`DailyRecord`]s. A full load produces one [`AreaCollection`], built
//! through an exclusive [`AreaCollectionBuilder`] and frozen before it is
//! handed to callers.

use std::ops::Deref;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which source family an [`Area`] came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AreaKind {
    /// A US state (or territory) from the long-format states table.
    UsState,
    /// A US county from the long-format counties table.
    UsCounty,
    /// A country or province from the wide-format world tables.
    World,
}

/// How area keys for US states and counties are spelled.
///
/// World keys are always `"Province, Country"` / `"Country"`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyFormat {
    /// `"Missouri"` and `"Jackson, MO"`.
    Abbreviated,
    /// `"Missouri, US"` and `"Jackson, Missouri, US"`. Matches the
    /// population table's `Combined_Key` convention.
    #[default]
    Qualified,
}

/// One day of data for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    /// Calendar date (UTC, no time component).
    pub date: NaiveDate,
    /// Cumulative confirmed cases reported to date.
    pub cases: u64,
    /// Cumulative deaths reported to date.
    pub deaths: u64,
    /// Cases minus the previous day's cases. Negative when upstream data
    /// was corrected downwards.
    #[serde(default)]
    pub new_cases: i64,
    /// Deaths minus the previous day's deaths.
    #[serde(default)]
    pub new_deaths: i64,
    /// Trailing average of `new_cases`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_new_cases: Option<f64>,
    /// Trailing average of `new_deaths`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_new_deaths: Option<f64>,
    /// Population of the area, when the population join found it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}

impl DailyRecord {
    /// Creates an undecorated record from cumulative counts.
    #[must_use]
    pub const fn new(date: NaiveDate, cases: u64, deaths: u64) -> Self {
        Self {
            date,
            cases,
            deaths,
            new_cases: 0,
            new_deaths: 0,
            moving_new_cases: None,
            moving_new_deaths: None,
            population: None,
        }
    }
}

/// A geographic entity with its own time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Stable identifier, e.g. `"Jackson, Missouri, US"` or `"Hubei, China"`.
    pub key: String,
    /// Source family this area was loaded from.
    pub kind: AreaKind,
    /// Records ordered ascending by date.
    pub values: Vec<DailyRecord>,
}

impl Area {
    /// Creates an area from already-ordered records.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: AreaKind, values: Vec<DailyRecord>) -> Self {
        Self {
            key: key.into(),
            kind,
            values,
        }
    }

    /// The most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&DailyRecord> {
        self.values.last()
    }

    /// Date of the first record.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.values.first().map(|r| r.date)
    }

    /// Date of the last record.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.values.last().map(|r| r.date)
    }

    /// Returns `true` when dates are strictly ascending (sorted, no
    /// duplicates).
    #[must_use]
    pub fn is_chronological(&self) -> bool {
        self.values.windows(2).all(|w| w[0].date < w[1].date)
    }
}

/// Exclusive, mutable owner of areas while a load is in progress.
///
/// Call [`AreaCollectionBuilder::freeze`] to obtain the immutable
/// [`AreaCollection`].
#[derive(Debug, Default)]
pub struct AreaCollectionBuilder {
    areas: Vec<Area>,
}

impl AreaCollectionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { areas: Vec::new() }
    }

    /// Appends one area.
    pub fn push(&mut self, area: Area) {
        self.areas.push(area);
    }

    /// Appends areas, keeping their order.
    pub fn extend(&mut self, areas: impl IntoIterator<Item = Area>) {
        self.areas.extend(areas);
    }

    /// Replaces every area with the result of `f`, in order.
    pub fn map_areas(&mut self, f: impl FnMut(Area) -> Area) {
        let areas = std::mem::take(&mut self.areas);
        self.areas = areas.into_iter().map(f).collect();
    }

    /// Removes and returns every area collected so far, leaving the
    /// builder empty.
    pub fn take_areas(&mut self) -> Vec<Area> {
        std::mem::take(&mut self.areas)
    }

    /// Number of areas collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether no area has been collected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Read access to the areas collected so far.
    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Ends construction and returns the shared, read-only collection.
    #[must_use]
    pub fn freeze(self) -> AreaCollection {
        AreaCollection {
            areas: self.areas.into(),
        }
    }
}

/// The immutable result of one load.
///
/// Cloning is cheap (reference counted) and the collection can be read
/// from any number of threads without synchronization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<Area>")]
pub struct AreaCollection {
    areas: Arc<[Area]>,
}

impl AreaCollection {
    /// Looks an area up by key. Linear scan; collections are small enough
    /// that callers rarely need an index.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.key == key)
    }

    /// Iterates areas of one kind, in load order.
    pub fn of_kind(&self, kind: AreaKind) -> impl Iterator<Item = &Area> {
        self.areas.iter().filter(move |a| a.kind == kind)
    }
}

impl Deref for AreaCollection {
    type Target = [Area];

    fn deref(&self) -> &Self::Target {
        &self.areas
    }
}

impl From<Vec<Area>> for AreaCollection {
    fn from(areas: Vec<Area>) -> Self {
        Self {
            areas: areas.into(),
        }
    }
}

impl Serialize for AreaCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.areas.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, cases: u64) -> DailyRecord {
        DailyRecord::new(NaiveDate::from_ymd_opt(2020, 3, d).unwrap(), cases, 0)
    }

    #[test]
    fn chronological_rejects_duplicates_and_reversals() {
        let ordered = Area::new("France", AreaKind::World, vec![day(1, 1), day(2, 2)]);
        assert!(ordered.is_chronological());

        let duplicate = Area::new("France", AreaKind::World, vec![day(1, 1), day(1, 2)]);
        assert!(!duplicate.is_chronological());

        let reversed = Area::new("France", AreaKind::World, vec![day(2, 1), day(1, 2)]);
        assert!(!reversed.is_chronological());
    }

    #[test]
    fn frozen_collection_keeps_builder_order() {
        let mut builder = AreaCollectionBuilder::new();
        builder.push(Area::new("Ohio, US", AreaKind::UsState, vec![day(1, 1)]));
        builder.extend([
            Area::new("Adams, Ohio, US", AreaKind::UsCounty, vec![day(1, 1)]),
            Area::new("France", AreaKind::World, vec![day(1, 1)]),
        ]);
        let collection = builder.freeze();

        let keys: Vec<&str> = collection.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["Ohio, US", "Adams, Ohio, US", "France"]);
        assert_eq!(collection.of_kind(AreaKind::World).count(), 1);
        assert!(collection.get("France").is_some());
        assert!(collection.get("Spain").is_none());
    }

    #[test]
    fn take_areas_empties_builder() {
        let mut builder = AreaCollectionBuilder::new();
        builder.push(Area::new("France", AreaKind::World, vec![day(1, 5)]));

        let taken = builder.take_areas();
        assert_eq!(taken.len(), 1);
        assert!(builder.is_empty());

        builder.extend(taken);
        assert_eq!(builder.freeze().get("France").map(|a| a.values.len()), Some(1));
    }

    #[test]
    fn map_areas_replaces_in_place() {
        let mut builder = AreaCollectionBuilder::new();
        builder.push(Area::new("France", AreaKind::World, vec![day(1, 5)]));
        builder.map_areas(|mut area| {
            area.values[0].new_cases = 5;
            area
        });
        assert_eq!(builder.areas()[0].values[0].new_cases, 5);
    }

    #[test]
    fn serializes_camel_case_and_skips_missing_enrichment() {
        let collection = AreaCollection::from(vec![Area::new(
            "France",
            AreaKind::World,
            vec![day(1, 5)],
        )]);
        let json = serde_json::to_value(&collection).unwrap();
        let record = &json[0]["values"][0];

        assert_eq!(json[0]["kind"], "world");
        assert_eq!(record["date"], "2020-03-01");
        assert_eq!(record["newCases"], 0);
        assert!(record.get("population").is_none());
        assert!(record.get("movingNewCases").is_none());
    }

    #[test]
    fn parses_key_format_names() {
        assert_eq!("qualified".parse::<KeyFormat>().unwrap(), KeyFormat::Qualified);
        assert_eq!(
            "abbreviated".parse::<KeyFormat>().unwrap(),
            KeyFormat::Abbreviated
        );
        assert_eq!(KeyFormat::default(), KeyFormat::Qualified);
    }
}
