//! Population lookup table.
//!
//! Reads the JHU `UID_ISO_FIPS_LookUp_Table.csv`, which carries a
//! `Combined_Key` per entity (`"France"`, `"Hubei, China"`,
//! `"Autauga, Alabama, US"`) and its population.

use covid_tracker_scraper::CsvTable;

use crate::SourceError;
use crate::parsing::parse_count;
use crate::us::require_columns;

/// Join key column header.
pub const COMBINED_KEY_COLUMN: &str = "Combined_Key";
/// Population column header.
pub const POPULATION_COLUMN: &str = "Population";

/// One usable row of the lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationEntry {
    /// Key in area-key format.
    pub combined_key: String,
    /// Population count.
    pub population: u64,
}

/// Extracts population entries in table order.
///
/// Rows without a usable population (cruise ships and aggregate rows leave
/// it blank) are skipped.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumn`] when either column is absent.
pub fn population_entries(
    table: &CsvTable,
    label: &str,
) -> Result<Vec<PopulationEntry>, SourceError> {
    require_columns(table, label, &[COMBINED_KEY_COLUMN, POPULATION_COLUMN])?;

    let mut entries = Vec::with_capacity(table.len());

    for row in table.rows() {
        let combined_key = row.get(COMBINED_KEY_COLUMN).unwrap_or_default();
        let raw = row.get(POPULATION_COLUMN).unwrap_or_default();

        match parse_count(POPULATION_COLUMN, raw) {
            Ok(population) => entries.push(PopulationEntry {
                combined_key: combined_key.to_owned(),
                population,
            }),
            Err(e) => log::debug!("[{label}] no population for '{combined_key}': {e}"),
        }
    }

    log::info!(
        "[{label}] {} population entries ({} skipped)",
        entries.len(),
        table.len() - entries.len()
    );

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use covid_tracker_scraper::parse_csv;

    use super::*;

    #[test]
    fn reads_entries_and_skips_blank_population() {
        let csv = "\
UID,iso2,Combined_Key,Population
250,FR,France,65273512
9999,,Diamond Princess,
84001001,US,\"Autauga, Alabama, US\",55869
";
        let table = parse_csv(csv.as_bytes(), b',', None).unwrap();
        let entries = population_entries(&table, "population").unwrap();

        assert_eq!(
            entries,
            [
                PopulationEntry {
                    combined_key: "France".to_owned(),
                    population: 65_273_512,
                },
                PopulationEntry {
                    combined_key: "Autauga, Alabama, US".to_owned(),
                    population: 55_869,
                },
            ]
        );
    }

    #[test]
    fn missing_population_column_is_fatal() {
        let table = parse_csv(b"Combined_Key\nFrance\n", b',', None).unwrap();
        assert!(matches!(
            population_entries(&table, "population"),
            Err(SourceError::MissingColumn { .. })
        ));
    }
}
