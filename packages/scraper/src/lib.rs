#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular data fetching for case/death time series sources.
//!
//! Provides the [`TableSource`] trait plus two implementations: an HTTP
//! (and local file) downloader in [`csv_download`] and an in-memory source
//! in [`memory`]. Every table comes back as a [`CsvTable`]: the ordered
//! header row plus raw string cells that callers look up by column name.
//!
//! This crate does no typing or normalization of its own. Parsing dates and
//! counts out of the string cells is the caller's job.

pub mod csv_download;
pub mod memory;

use std::collections::HashMap;

pub use csv_download::{HttpTableSource, TableRequest};
pub use memory::InMemoryTableSource;

/// Errors that can occur while fetching or parsing a table.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No table is available at the requested locator.
    #[error("No table found at {0}")]
    NotFound(String),
}

/// A parsed CSV table with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    columns: HashMap<String, usize>,
}

impl CsvTable {
    /// Builds a table from a header row and data rows. Short rows are
    /// treated as having empty trailing cells.
    #[must_use]
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let mut columns = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            // First occurrence wins for duplicated header names.
            columns.entry(header.clone()).or_insert(i);
        }
        Self {
            headers,
            records,
            columns,
        }
    }

    /// Header names in column order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows (the header row is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the position of a column by header name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Returns the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<CsvRow<'_>> {
        self.records.get(index).map(|values| CsvRow {
            table: self,
            values,
        })
    }

    /// Iterates rows in file order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = CsvRow<'_>> {
        self.records.iter().map(|values| CsvRow {
            table: self,
            values,
        })
    }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    table: &'a CsvTable,
    values: &'a [String],
}

impl<'a> CsvRow<'a> {
    /// Returns the cell under the named column. `None` when the table has
    /// no such column; an empty string when the row is short.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.table.column_index(column)?;
        Some(self.get_index(index).unwrap_or(""))
    }

    /// Returns the cell at a column position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).map(String::as_str)
    }
}

/// Parses CSV bytes with a header row into a [`CsvTable`].
///
/// Cells and headers are trimmed. Rows may have a different number of
/// fields than the header.
///
/// # Errors
///
/// Returns [`ScrapeError::Csv`] on malformed CSV and [`ScrapeError::Parse`]
/// when the header row is missing.
pub fn parse_csv(
    bytes: &[u8],
    delimiter: u8,
    max_records: Option<u64>,
) -> Result<CsvTable, ScrapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ScrapeError::Parse(
            "CSV file contains no header row".to_owned(),
        ));
    }

    let mut records: Vec<Vec<String>> = Vec::new();

    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(|v| v.trim().to_owned()).collect());

        if let Some(max) = max_records
            && records.len() as u64 >= max
        {
            log::info!("Reached max_records limit ({max}), stopping CSV parse");
            break;
        }
    }

    Ok(CsvTable::new(headers, records))
}

/// Something that can produce a [`CsvTable`] for a [`TableRequest`].
///
/// Loads against a `TableSource` are independent of each other, so callers
/// are free to issue several `fetch_table` futures at once.
pub trait TableSource: Send + Sync {
    /// Fetches and parses one table.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the table cannot be retrieved or parsed.
    fn fetch_table(
        &self,
        request: &TableRequest,
    ) -> impl std::future::Future<Output = Result<CsvTable, ScrapeError>> + Send;
}
