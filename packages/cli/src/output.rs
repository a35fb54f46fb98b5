//! Printers for the `load`, `show`, `top` and `sources` commands.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use chrono::NaiveDate;
use covid_tracker_series_models::{Area, AreaCollection, AreaKind, DailyRecord};
use covid_tracker_source::config::LoadConfig;

/// Headline numbers for a finished load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub areas_by_kind: BTreeMap<AreaKind, usize>,
    pub records: usize,
    pub with_population: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Summary {
    #[must_use]
    pub fn of(areas: &AreaCollection) -> Self {
        let mut summary = Self::default();
        for area in areas.iter() {
            *summary.areas_by_kind.entry(area.kind).or_default() += 1;
            summary.records += area.values.len();
            if area.latest().is_some_and(|r| r.population.is_some()) {
                summary.with_population += 1;
            }
            if let Some(first) = area.first_date() {
                summary.first_date = Some(summary.first_date.map_or(first, |d| d.min(first)));
            }
            summary.last_date = summary.last_date.max(area.last_date());
        }
        summary
    }

    #[must_use]
    pub fn areas(&self) -> usize {
        self.areas_by_kind.values().sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} AREAS", "KIND")?;
        writeln!(f, "{}", "-".repeat(24))?;
        for (kind, count) in &self.areas_by_kind {
            writeln!(f, "{:<12} {count}", kind.as_ref())?;
        }
        writeln!(f)?;
        writeln!(f, "Areas:           {}", self.areas())?;
        writeln!(f, "Daily records:   {}", self.records)?;
        writeln!(f, "With population: {}", self.with_population)?;
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => write!(f, "Dates:           {first} to {last}"),
            _ => write!(f, "Dates:           none"),
        }
    }
}

/// Lists configured tables and their locators.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_sources(out: &mut impl Write, config: &LoadConfig) -> io::Result<()> {
    writeln!(out, "{:<16} URL", "TABLE")?;
    writeln!(out, "{}", "-".repeat(60))?;
    for (name, location) in config.sources.all() {
        writeln!(out, "{name:<16} {}", location.url)?;
    }
    Ok(())
}

/// The last `last` records of `values`, or all of them.
#[must_use]
pub fn tail(values: &[DailyRecord], last: Option<usize>) -> &[DailyRecord] {
    match last {
        Some(n) => &values[values.len().saturating_sub(n)..],
        None => values,
    }
}

/// Writes one area as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(out: &mut impl Write, area: &Area, last: Option<usize>) -> io::Result<()> {
    let trimmed = Area::new(area.key.clone(), area.kind, tail(&area.values, last).to_vec());
    serde_json::to_writer_pretty(&mut *out, &trimmed)?;
    writeln!(out)
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes daily records as CSV with a header row. Absent derived fields
/// are written as empty cells.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv(out: impl Write, values: &[DailyRecord]) -> io::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "date",
        "cases",
        "deaths",
        "newCases",
        "newDeaths",
        "movingNewCases",
        "movingNewDeaths",
        "population",
    ])?;

    for day in values {
        writer.write_record([
            day.date.format("%Y-%m-%d").to_string(),
            day.cases.to_string(),
            day.deaths.to_string(),
            day.new_cases.to_string(),
            day.new_deaths.to_string(),
            optional(day.moving_new_cases),
            optional(day.moving_new_deaths),
            optional(day.population),
        ])?;
    }

    writer.flush()
}

/// Latest-day activity used to rank areas: the moving average of new cases
/// when present, otherwise raw new cases.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn activity(area: &Area) -> Option<f64> {
    area.latest()
        .map(|day| day.moving_new_cases.unwrap_or(day.new_cases as f64))
}

/// Areas with the highest [`activity`], descending. Ties keep load order.
#[must_use]
pub fn rank(areas: &AreaCollection, limit: usize) -> Vec<(&Area, f64)> {
    let mut ranked: Vec<(&Area, f64)> = areas
        .iter()
        .filter_map(|area| activity(area).map(|value| (area, value)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// Writes a ranking table.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_rank(out: &mut impl Write, ranked: &[(&Area, f64)]) -> io::Result<()> {
    writeln!(out, "{:>4}  {:<40} {:>12}", "#", "AREA", "NEW CASES")?;
    writeln!(out, "{}", "-".repeat(58))?;
    for (position, (area, value)) in ranked.iter().enumerate() {
        writeln!(out, "{:>4}  {:<40} {value:>12.1}", position + 1, area.key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: u64, cases: u64, new_cases: i64) -> DailyRecord {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap();
        let mut record = DailyRecord::new(date, cases, 0);
        record.new_cases = new_cases;
        record
    }

    fn collection() -> AreaCollection {
        let mut ohio = vec![day(0, 10, 10), day(1, 30, 20)];
        ohio[1].moving_new_cases = Some(15.0);
        ohio[1].population = Some(11_689_100);

        AreaCollection::from(vec![
            Area::new("Ohio, US", AreaKind::UsState, ohio),
            Area::new("France", AreaKind::World, vec![day(0, 5, 5), day(1, 45, 40)]),
            Area::new("Jackson, Missouri, US", AreaKind::UsCounty, vec![day(0, 1, 1)]),
        ])
    }

    #[test]
    fn summary_counts_kinds_records_and_population() {
        let summary = Summary::of(&collection());
        assert_eq!(summary.areas(), 3);
        assert_eq!(summary.areas_by_kind[&AreaKind::UsState], 1);
        assert_eq!(summary.areas_by_kind[&AreaKind::World], 1);
        assert_eq!(summary.records, 5);
        assert_eq!(summary.with_population, 1);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2020, 3, 2));
        let text = summary.to_string();
        assert!(text.contains("us_county"));
        assert!(text.contains("2020-03-01 to 2020-03-02"));
    }

    #[test]
    fn rank_prefers_moving_average_and_limits() {
        let areas = collection();
        let ranked = rank(&areas, 2);
        let keys: Vec<&str> = ranked.iter().map(|(a, _)| a.key.as_str()).collect();
        assert_eq!(keys, ["France", "Ohio, US"]);
        assert!((ranked[1].1 - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn csv_leaves_missing_fields_blank() {
        let areas = collection();
        let mut out = Vec::new();
        write_csv(&mut out, &areas[0].values).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,cases,deaths,newCases,newDeaths,movingNewCases,movingNewDeaths,population"
        );
        assert_eq!(lines[1], "2020-03-01,10,0,10,0,,,");
        assert_eq!(lines[2], "2020-03-02,30,0,20,0,15,,11689100");
    }

    #[test]
    fn json_respects_last() {
        let areas = collection();
        let mut out = Vec::new();
        write_json(&mut out, &areas[0], Some(1)).unwrap();
        let parsed: Area = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.values.len(), 1);
        assert_eq!(parsed.values[0].population, Some(11_689_100));
    }

    #[test]
    fn tail_handles_oversized_last() {
        let areas = collection();
        assert_eq!(tail(&areas[1].values, Some(10)).len(), 2);
        assert!(tail(&areas[1].values, Some(0)).is_empty());
    }

    #[test]
    fn sources_lists_every_table() {
        let mut out = Vec::new();
        write_sources(&mut out, &LoadConfig::embedded()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("world_deaths"));
        assert!(text.contains("population"));
    }
}
