//! CSV file downloader.
//!
//! Downloads a CSV (optionally gzip-compressed) from a URL, or reads it from
//! a local path, and parses it into a [`CsvTable`].

use std::collections::BTreeMap;
use std::io::Read as _;
use std::time::Duration;

use crate::{CsvTable, ScrapeError, TableSource, parse_csv};

/// Describes one table to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    /// `http(s)://` URL or local filesystem path of the CSV file.
    url: String,
    /// Additional HTTP headers for the download request.
    headers: BTreeMap<String, String>,
    /// Whether the body is gzip-compressed.
    is_gzipped: bool,
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
    /// Optional cap on the number of records to parse.
    max_records: Option<u64>,
}

impl TableRequest {
    /// Creates a request for the given locator with default settings
    /// (comma-delimited, not gzipped, no record limit).
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            headers: BTreeMap::new(),
            is_gzipped: false,
            delimiter: b',',
            max_records: None,
        }
    }

    /// Marks the body as gzip-compressed so that it is decompressed before
    /// CSV parsing.
    #[must_use]
    pub const fn with_gzip(mut self, gzipped: bool) -> Self {
        self.is_gzipped = gzipped;
        self
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Limits the number of records that will be parsed from the file.
    #[must_use]
    pub const fn with_max_records(mut self, max: u64) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Adds an HTTP header to include in the download request.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// The locator this request points at.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The configured field delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// The configured record cap.
    #[must_use]
    pub const fn max_records(&self) -> Option<u64> {
        self.max_records
    }

    /// Whether the locator is a remote URL rather than a local path.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// Builds the header map for the download request.
    fn header_map(&self) -> Result<reqwest::header::HeaderMap, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        Ok(header_map)
    }

    /// Decompresses (when configured) and parses raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if decompression or CSV parsing fails.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<CsvTable, ScrapeError> {
        let csv_bytes: Vec<u8> = if self.is_gzipped {
            let mut decoder = flate2::read::GzDecoder::new(bytes);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            log::debug!("Decompressed to {} bytes", decompressed.len());
            decompressed
        } else {
            bytes.to_vec()
        };

        parse_csv(&csv_bytes, self.delimiter, self.max_records)
    }
}

/// [`TableSource`] backed by `reqwest` for remote URLs and the filesystem
/// for local paths.
#[derive(Debug, Clone)]
pub struct HttpTableSource {
    client: reqwest::Client,
}

impl HttpTableSource {
    /// Creates a source with an optional per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ScrapeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn download(&self, request: &TableRequest) -> Result<Vec<u8>, ScrapeError> {
        let response = self
            .client
            .get(request.url())
            .headers(request.header_map()?)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        log::debug!("Downloaded {} bytes from {}", bytes.len(), request.url());

        Ok(bytes.to_vec())
    }
}

impl TableSource for HttpTableSource {
    async fn fetch_table(&self, request: &TableRequest) -> Result<CsvTable, ScrapeError> {
        let bytes = if request.is_remote() {
            self.download(request).await?
        } else {
            match tokio::fs::read(request.url()).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ScrapeError::NotFound(request.url().to_owned()));
                }
                Err(e) => return Err(e.into()),
            }
        };

        let table = request.parse_bytes(&bytes)?;

        log::info!("Parsed {} records from CSV at {}", table.len(), request.url());

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn detects_remote_locators() {
        assert!(TableRequest::new("https://example.com/a.csv").is_remote());
        assert!(TableRequest::new("http://example.com/a.csv").is_remote());
        assert!(!TableRequest::new("data/us-states.csv").is_remote());
    }

    #[test]
    fn parses_gzipped_bytes() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"date,cases\n2020-03-01,5\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let table = TableRequest::new("x.csv.gz")
            .with_gzip(true)
            .parse_bytes(&compressed)
            .unwrap();
        assert_eq!(table.row(0).unwrap().get("cases"), Some("5"));
    }

    #[test]
    fn parses_tab_delimited_bytes() {
        let table = TableRequest::new("x.tsv")
            .with_delimiter(b'\t')
            .parse_bytes(b"a\tb\n1\t2\n")
            .unwrap();
        assert_eq!(table.row(0).unwrap().get("b"), Some("2"));
    }

    #[test]
    fn rejects_invalid_header_names() {
        let request = TableRequest::new("https://example.com").with_header("bad header", "x");
        assert!(matches!(request.header_map(), Err(ScrapeError::Parse(_))));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let path = std::env::temp_dir().join(format!(
            "covid_tracker_scraper_{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, "date,cases\n2020-03-01,5\n").unwrap();

        let source = HttpTableSource::new(None).unwrap();
        let table = source
            .fetch_table(&TableRequest::new(path.to_str().unwrap()))
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let source = HttpTableSource::new(None).unwrap();
        let result = source
            .fetch_table(&TableRequest::new("/nonexistent/covid_tracker.csv"))
            .await;
        assert!(matches!(result, Err(ScrapeError::NotFound(_))));
    }
}
