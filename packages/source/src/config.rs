//! Load configuration.
//!
//! A [`LoadConfig`] names the tables to fetch and which derived fields to
//! compute. The default configuration is baked into the binary via
//! [`include_str!`]; any other TOML file with the same shape can replace it.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use covid_tracker_scraper::TableRequest;
use covid_tracker_series_models::KeyFormat;
use serde::Deserialize;

use crate::SourceError;
use crate::parsing::MalformedRowPolicy;

/// TOML config embedded at compile time.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Window used when the config does not set one.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

/// Everything a load needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadConfig {
    /// Which derived fields to compute and how to key areas.
    #[serde(default)]
    pub derive: DeriveConfig,
    /// Where each table lives.
    pub sources: SourceTables,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Pipeline switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    /// Spelling of US state and county keys.
    pub key_format: KeyFormat,
    /// Compute `moving_new_cases` / `moving_new_deaths`.
    pub include_moving_average: bool,
    /// Fetch the population table and join it onto areas.
    pub include_population: bool,
    /// Number of trailing days averaged.
    pub moving_average_window: usize,
    /// What to do with rows that have unusable fields.
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            key_format: KeyFormat::default(),
            include_moving_average: true,
            include_population: true,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            malformed_rows: MalformedRowPolicy::default(),
        }
    }
}

/// Locations of the input tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceTables {
    /// Long-format US states table.
    pub us_states: TableLocation,
    /// Long-format US counties table.
    pub us_counties: TableLocation,
    /// Wide-format world confirmed-cases table.
    pub world_confirmed: TableLocation,
    /// Wide-format world deaths table.
    pub world_deaths: TableLocation,
    /// Population lookup table. Required when population is enabled.
    pub population: Option<TableLocation>,
}

impl SourceTables {
    /// Every configured table with its config name, in load order.
    #[must_use]
    pub fn all(&self) -> Vec<(&'static str, &TableLocation)> {
        let mut tables = vec![
            ("us_states", &self.us_states),
            ("us_counties", &self.us_counties),
            ("world_confirmed", &self.world_confirmed),
            ("world_deaths", &self.world_deaths),
        ];
        if let Some(population) = &self.population {
            tables.push(("population", population));
        }
        tables
    }
}

/// Where and how to fetch one CSV table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableLocation {
    /// `http(s)://` URL or local path.
    pub url: String,
    /// Field delimiter (default: comma).
    pub delimiter: Option<String>,
    /// Compression format: `"gzip"` or omit for uncompressed.
    pub compressed: Option<String>,
    /// Maximum records to parse.
    pub max_records: Option<u64>,
    /// Additional HTTP headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl TableLocation {
    /// Location with defaults for everything but the locator.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            delimiter: None,
            compressed: None,
            max_records: None,
            headers: BTreeMap::new(),
        }
    }

    /// Builds the fetch request for this table.
    #[must_use]
    pub fn request(&self) -> TableRequest {
        let mut request = TableRequest::new(&self.url);

        if let Some(delim) = &self.delimiter
            && let Some(byte) = delim.as_bytes().first()
        {
            request = request.with_delimiter(*byte);
        }

        if self.compressed.as_deref() == Some("gzip") {
            request = request.with_gzip(true);
        }

        if let Some(limit) = self.max_records {
            request = request.with_max_records(limit);
        }

        for (key, value) in &self.headers {
            request = request.with_header(key, value);
        }

        request
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl HttpConfig {
    /// The timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl LoadConfig {
    /// Returns the configuration embedded in the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded and covered by tests).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default.toml: {e}"))
    }

    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the TOML is malformed and
    /// [`SourceError::InvalidConfig`] if it fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SourceError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read, otherwise as
    /// [`LoadConfig::from_toml_str`].
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks settings that TOML deserialization cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidConfig`] for a zero moving-average
    /// window or when population is enabled without a population table.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.derive.include_moving_average && self.derive.moving_average_window == 0 {
            return Err(SourceError::InvalidConfig(
                "moving_average_window must be at least 1".to_owned(),
            ));
        }
        if self.derive.include_population && self.sources.population.is_none() {
            return Err(SourceError::InvalidConfig(
                "include_population is set but [sources.population] is missing".to_owned(),
            ));
        }
        Ok(())
    }
}
