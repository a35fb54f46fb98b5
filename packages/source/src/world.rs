//! Wide-format world tables (one column per date).
//!
//! The JHU confirmed and deaths tables share a header of
//! `Province/State,Country/Region,Lat,Long,<date>,<date>,...` and list the
//! same entities in the same row order. Each row pair becomes one [`Area`].

use chrono::NaiveDate;
use covid_tracker_scraper::{CsvRow, CsvTable};
use covid_tracker_series_models::{Area, AreaKind, DailyRecord};

use crate::SourceError;
use crate::keys::world_key;
use crate::parsing::{
    DateFormat, MalformedRowPolicy, RowDiagnostic, collect, parse_count, parse_date,
};
use crate::us::require_columns;

/// Province column header.
pub const PROVINCE_COLUMN: &str = "Province/State";
/// Country column header.
pub const COUNTRY_COLUMN: &str = "Country/Region";
/// Position of the first date column.
pub const FIRST_DATE_COLUMN: usize = 4;

/// Date column headers of a wide table, in column order.
#[must_use]
pub fn date_columns(table: &CsvTable) -> &[String] {
    table.headers().get(FIRST_DATE_COLUMN..).unwrap_or_default()
}

fn row_key(row: &CsvRow<'_>) -> String {
    world_key(
        row.get(PROVINCE_COLUMN).unwrap_or_default(),
        row.get(COUNTRY_COLUMN).unwrap_or_default(),
    )
}

fn parse_date_columns(headers: &[String]) -> Result<Vec<NaiveDate>, SourceError> {
    headers
        .iter()
        .map(|header| {
            parse_date(header, header, DateFormat::UsShort).map_err(|e| {
                SourceError::Normalization {
                    message: format!("world date column: {e}"),
                }
            })
        })
        .collect()
}

/// Reshapes the confirmed and deaths tables into one area per row pair.
///
/// # Errors
///
/// Returns [`SourceError::ShapeMismatch`] when the two tables do not pair
/// up (row count, date columns, or per-row keys differ),
/// [`SourceError::Normalization`] when a date header cannot be parsed, and
/// [`SourceError::MalformedRow`] for a bad count cell under
/// [`MalformedRowPolicy::Fail`].
pub fn world_areas(
    cases: &CsvTable,
    deaths: &CsvTable,
    label: &str,
    policy: MalformedRowPolicy,
) -> Result<Vec<Area>, SourceError> {
    require_columns(cases, label, &[PROVINCE_COLUMN, COUNTRY_COLUMN])?;
    require_columns(deaths, label, &[PROVINCE_COLUMN, COUNTRY_COLUMN])?;

    if cases.len() != deaths.len() {
        return Err(SourceError::ShapeMismatch {
            message: format!(
                "{} confirmed rows vs {} deaths rows",
                cases.len(),
                deaths.len()
            ),
        });
    }

    let headers = date_columns(cases);
    if headers != date_columns(deaths) {
        return Err(SourceError::ShapeMismatch {
            message: "confirmed and deaths date columns differ".to_owned(),
        });
    }
    let dates = parse_date_columns(headers)?;

    let mut areas = Vec::with_capacity(cases.len());
    let mut rejected: usize = 0;

    for (index, (case_row, death_row)) in cases.rows().zip(deaths.rows()).enumerate() {
        let key = row_key(&case_row);
        let death_key = row_key(&death_row);
        if key != death_key {
            return Err(SourceError::ShapeMismatch {
                message: format!("row {index}: '{key}' paired with '{death_key}'"),
            });
        }

        let mut values = Vec::with_capacity(dates.len());

        for (offset, (&date, header)) in dates.iter().zip(headers).enumerate() {
            let column = FIRST_DATE_COLUMN + offset;
            let mut errors = Vec::new();
            let case_count = collect(
                &mut errors,
                parse_count(header, case_row.get_index(column).unwrap_or_default()),
            );
            let death_count = collect(
                &mut errors,
                parse_count(header, death_row.get_index(column).unwrap_or_default()),
            );

            if let (Some(c), Some(d)) = (case_count, death_count) {
                values.push(DailyRecord::new(date, c, d));
            } else {
                rejected += 1;
                policy.reject(label, RowDiagnostic::for_row(index, errors))?;
            }
        }

        if values.is_empty() {
            log::warn!("[{label}] '{key}' has no usable dates, dropping");
            continue;
        }

        areas.push(Area::new(key, AreaKind::World, values));
    }

    if rejected > 0 {
        log::info!("[{label}] rejected {rejected} malformed cells");
    }
    log::info!(
        "[{label}] {} areas over {} dates",
        areas.len(),
        dates.len()
    );

    Ok(areas)
}

#[cfg(test)]
mod tests {
    use covid_tracker_scraper::parse_csv;

    use super::*;

    const HEADER: &str = "Province/State,Country/Region,Lat,Long";

    const CASES: &str = "\
Province/State,Country/Region,Lat,Long,3/1/20,3/2/20
Hubei,China,30.9,112.2,100,150
,France,46.2,2.2,5,7
";

    const DEATHS: &str = "\
Province/State,Country/Region,Lat,Long,3/1/20,3/2/20
Hubei,China,30.9,112.2,2,3
,France,46.2,2.2,0,1
";

    fn table(csv: &str) -> CsvTable {
        parse_csv(csv.as_bytes(), b',', None).unwrap()
    }

    /// Builds a table from the fixed leading columns, `dates` and `rows`.
    fn wide(dates: &str, rows: &[&str]) -> CsvTable {
        let mut csv = format!("{HEADER}{dates}\n");
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        table(&csv)
    }

    fn reshape(cases: &CsvTable, deaths: &CsvTable) -> Result<Vec<Area>, SourceError> {
        world_areas(cases, deaths, "world", MalformedRowPolicy::Skip)
    }

    #[test]
    fn reshapes_single_date_column() {
        let cases = wide(",3/1/20", &[",France,0,0,5"]);
        let deaths = wide(",3/1/20", &[",France,0,0,1"]);

        let areas = reshape(&cases, &deaths).unwrap();

        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].key, "France");
        assert_eq!(
            areas[0].values,
            [DailyRecord::new(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), 5, 1)]
        );
    }

    #[test]
    fn keys_and_orders_rows() {
        let areas = reshape(&table(CASES), &table(DEATHS)).unwrap();

        let keys: Vec<&str> = areas.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["Hubei, China", "France"]);
        assert!(areas.iter().all(Area::is_chronological));
        let hubei: Vec<(u64, u64)> = areas[0]
            .values
            .iter()
            .map(|r| (r.cases, r.deaths))
            .collect();
        assert_eq!(hubei, [(100, 2), (150, 3)]);
    }

    #[test]
    fn row_count_mismatch_is_fatal() {
        let deaths = wide(",3/1/20,3/2/20", &["Hubei,China,0,0,2,3"]);
        let err = reshape(&table(CASES), &deaths).unwrap_err();
        assert!(matches!(err, SourceError::ShapeMismatch { .. }));
    }

    #[test]
    fn date_column_mismatch_is_fatal() {
        let deaths = wide(",3/1/20,3/3/20", &["Hubei,China,0,0,2,3", ",France,0,0,0,1"]);
        let err = reshape(&table(CASES), &deaths).unwrap_err();
        assert!(matches!(err, SourceError::ShapeMismatch { .. }));
    }

    #[test]
    fn misaligned_rows_are_fatal() {
        let deaths = wide(",3/1/20,3/2/20", &[",France,0,0,0,1", "Hubei,China,0,0,2,3"]);
        let err = reshape(&table(CASES), &deaths).unwrap_err();
        assert!(matches!(err, SourceError::ShapeMismatch { .. }));
    }

    #[test]
    fn bad_date_header_is_fatal() {
        let cases = wide(",2020-03-01", &[",France,0,0,5"]);
        let deaths = wide(",2020-03-01", &[",France,0,0,1"]);
        let err = reshape(&cases, &deaths).unwrap_err();
        assert!(matches!(err, SourceError::Normalization { .. }));
    }

    #[test]
    fn malformed_cell_follows_policy() {
        let cases = wide(",3/1/20,3/2/20", &[",France,0,0,5,"]);
        let deaths = wide(",3/1/20,3/2/20", &[",France,0,0,1,1"]);

        let skipped = reshape(&cases, &deaths).unwrap();
        assert_eq!(skipped[0].values.len(), 1);

        let failed = world_areas(&cases, &deaths, "world", MalformedRowPolicy::Fail);
        assert!(matches!(failed, Err(SourceError::MalformedRow { .. })));
    }

    #[test]
    fn no_date_columns_yields_no_areas() {
        let cases = wide("", &[",France,0,0"]);
        let deaths = wide("", &[",France,0,0"]);
        assert!(reshape(&cases, &deaths).unwrap().is_empty());
    }
}
