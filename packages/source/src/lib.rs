#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization of case/death source tables into areas.
//!
//! Each input table has its own shape: the NYT US tables are long format
//! (one row per area per day, see [`us`]), the JHU world tables are wide
//! format (one column per date, see [`world`]). Both end up as
//! [`covid_tracker_series_models::Area`] values keyed by [`keys`].
//! [`population`] reads the lookup table used for enrichment and
//! [`config`] describes where all of these tables live.

pub mod config;
pub mod keys;
pub mod parsing;
pub mod partition;
pub mod population;
pub mod progress;
pub mod states;
pub mod us;
pub mod world;

use covid_tracker_scraper::ScrapeError;

use crate::parsing::RowDiagnostic;

/// Errors that can occur while turning tables into areas.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Fetching or parsing a table failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// A row had unusable fields and the policy is to fail.
    #[error("[{table}] malformed row, {diagnostic}")]
    MalformedRow {
        /// Table label.
        table: String,
        /// What was wrong with the row.
        diagnostic: RowDiagnostic,
    },

    /// A required column is absent from the header row.
    #[error("[{table}] missing column '{column}'")]
    MissingColumn {
        /// Table label.
        table: String,
        /// Column header.
        column: String,
    },

    /// The world confirmed and deaths tables do not pair up.
    #[error("World tables do not line up: {message}")]
    ShapeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },

    /// The configuration TOML is malformed.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration parsed but is not usable.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
