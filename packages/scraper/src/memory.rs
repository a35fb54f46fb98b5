//! In-memory table source.
//!
//! Serves CSV text registered up front, keyed by locator. Used for tests
//! and for replaying snapshots without touching the network.

use std::collections::HashMap;

use crate::{CsvTable, ScrapeError, TableRequest, TableSource};

/// [`TableSource`] that answers from a fixed map of locator to CSV text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableSource {
    tables: HashMap<String, String>,
}

impl InMemoryTableSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers CSV text under a locator, replacing any earlier entry.
    #[must_use]
    pub fn with_table(mut self, url: &str, csv: &str) -> Self {
        self.tables.insert(url.to_owned(), csv.to_owned());
        self
    }
}

impl TableSource for InMemoryTableSource {
    async fn fetch_table(&self, request: &TableRequest) -> Result<CsvTable, ScrapeError> {
        let csv = self
            .tables
            .get(request.url())
            .ok_or_else(|| ScrapeError::NotFound(request.url().to_owned()))?;
        request.parse_bytes(csv.as_bytes())
    }
}
