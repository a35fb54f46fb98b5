//! Long-format US tables (one row per area per day).
//!
//! The NYT states table has `date,state,fips,cases,deaths` columns and the
//! counties table adds `county`. Rows are normalized into [`LongRow`]s and
//! partitioned by the key [`KeyFormat`] prescribes.

use chrono::NaiveDate;
use covid_tracker_scraper::{CsvRow, CsvTable};
use covid_tracker_series_models::{Area, AreaKind, DailyRecord, KeyFormat};

use crate::SourceError;
use crate::keys::{county_key, state_key};
use crate::parsing::{
    DateFormat, MalformedRowPolicy, RowDiagnostic, collect, parse_count, parse_date,
};
use crate::partition::partition;

/// Date column header.
pub const DATE_COLUMN: &str = "date";
/// State name column header.
pub const STATE_COLUMN: &str = "state";
/// County name column header.
pub const COUNTY_COLUMN: &str = "county";
/// Cumulative cases column header.
pub const CASES_COLUMN: &str = "cases";
/// Cumulative deaths column header.
pub const DEATHS_COLUMN: &str = "deaths";

/// A typed row of a long-format table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRow {
    /// Report date.
    pub date: NaiveDate,
    /// Full state name as spelled in the source.
    pub state: String,
    /// County name, for the counties table.
    pub county: Option<String>,
    /// Cumulative cases.
    pub cases: u64,
    /// Cumulative deaths.
    pub deaths: u64,
}

impl From<LongRow> for DailyRecord {
    fn from(row: LongRow) -> Self {
        Self::new(row.date, row.cases, row.deaths)
    }
}

/// Normalizes one raw row. `with_county` selects whether the `county`
/// column is read.
///
/// # Errors
///
/// Returns a [`RowDiagnostic`] listing every unusable field.
pub fn normalize_long_row(
    row: &CsvRow<'_>,
    index: usize,
    date_format: DateFormat,
    with_county: bool,
) -> Result<LongRow, RowDiagnostic> {
    let cell = |column: &str| row.get(column).unwrap_or("");
    let mut errors = Vec::new();

    let date = collect(
        &mut errors,
        parse_date(DATE_COLUMN, cell(DATE_COLUMN), date_format),
    );
    let cases = collect(&mut errors, parse_count(CASES_COLUMN, cell(CASES_COLUMN)));
    let deaths = collect(&mut errors, parse_count(DEATHS_COLUMN, cell(DEATHS_COLUMN)));

    match (date, cases, deaths) {
        (Some(date), Some(cases), Some(deaths)) if errors.is_empty() => Ok(LongRow {
            date,
            state: cell(STATE_COLUMN).to_owned(),
            county: with_county.then(|| cell(COUNTY_COLUMN).to_owned()),
            cases,
            deaths,
        }),
        _ => Err(RowDiagnostic::for_row(index, errors)),
    }
}

/// Checks that every named column is present in the header row.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumn`] for the first absent column.
pub fn require_columns(
    table: &CsvTable,
    label: &str,
    columns: &[&str],
) -> Result<(), SourceError> {
    for column in columns {
        if table.column_index(column).is_none() {
            return Err(SourceError::MissingColumn {
                table: label.to_owned(),
                column: (*column).to_owned(),
            });
        }
    }
    Ok(())
}

fn normalize_table(
    table: &CsvTable,
    label: &str,
    with_county: bool,
    policy: MalformedRowPolicy,
) -> Result<Vec<LongRow>, SourceError> {
    let mut rows = Vec::with_capacity(table.len());
    let mut rejected: usize = 0;

    for (index, raw) in table.rows().enumerate() {
        match normalize_long_row(&raw, index, DateFormat::Iso, with_county) {
            Ok(row) => rows.push(row),
            Err(diagnostic) => {
                rejected += 1;
                policy.reject(label, diagnostic)?;
            }
        }
    }

    if rejected > 0 {
        log::info!("[{label}] rejected {rejected} malformed rows");
    }

    Ok(rows)
}

/// Builds state areas from the US states table.
///
/// # Errors
///
/// Returns [`SourceError`] when a required column is missing, or when a row
/// is malformed under [`MalformedRowPolicy::Fail`].
pub fn state_areas(
    table: &CsvTable,
    label: &str,
    format: KeyFormat,
    policy: MalformedRowPolicy,
) -> Result<Vec<Area>, SourceError> {
    require_columns(
        table,
        label,
        &[DATE_COLUMN, STATE_COLUMN, CASES_COLUMN, DEATHS_COLUMN],
    )?;
    let rows = normalize_table(table, label, false, policy)?;
    let areas = partition(
        rows,
        AreaKind::UsState,
        |row| state_key(&row.state, format),
        DailyRecord::from,
    );

    log::info!("[{label}] {} states", areas.len());

    Ok(areas)
}

/// Builds county areas from the US counties table.
///
/// # Errors
///
/// Returns [`SourceError`] when a required column is missing, or when a row
/// is malformed under [`MalformedRowPolicy::Fail`].
pub fn county_areas(
    table: &CsvTable,
    label: &str,
    format: KeyFormat,
    policy: MalformedRowPolicy,
) -> Result<Vec<Area>, SourceError> {
    require_columns(
        table,
        label,
        &[
            DATE_COLUMN,
            COUNTY_COLUMN,
            STATE_COLUMN,
            CASES_COLUMN,
            DEATHS_COLUMN,
        ],
    )?;
    let rows = normalize_table(table, label, true, policy)?;
    let areas = partition(
        rows,
        AreaKind::UsCounty,
        |row| county_key(row.county.as_deref().unwrap_or_default(), &row.state, format),
        DailyRecord::from,
    );

    log::info!("[{label}] {} counties", areas.len());

    Ok(areas)
}
