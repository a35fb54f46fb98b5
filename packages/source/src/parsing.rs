//! Typed field parsing for raw CSV cells.
//!
//! Every parse returns a [`FieldError`] instead of a sentinel value. Errors
//! for one row are gathered into a [`RowDiagnostic`] and handed to the
//! configured [`MalformedRowPolicy`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::SourceError;

/// Date layout used by a source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `YYYY-MM-DD`, used by the NYT US tables.
    Iso,
    /// `M/D/YY`, used by the JHU world table headers.
    UsShort,
}

impl DateFormat {
    /// The `chrono` format string for this layout.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Iso => "%Y-%m-%d",
            Self::UsShort => "%m/%d/%y",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Iso => "YYYY-MM-DD",
            Self::UsShort => "M/D/YY",
        })
    }
}

/// Why a single cell could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The cell is empty.
    #[error("missing value for '{column}'")]
    Missing {
        /// Column header.
        column: String,
    },

    /// The cell is not a non-negative integer.
    #[error("'{column}': '{value}' is not a non-negative integer")]
    InvalidCount {
        /// Column header.
        column: String,
        /// Raw cell text.
        value: String,
    },

    /// The cell does not match the table's date layout.
    #[error("'{column}': '{value}' does not match {format}")]
    InvalidDate {
        /// Column header.
        column: String,
        /// Raw cell text.
        value: String,
        /// Expected layout.
        format: DateFormat,
    },
}

/// Every field error found in one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// 1-based line number in the source file (the header is line 1).
    pub line: usize,
    /// Field errors in column order.
    pub errors: Vec<FieldError>,
}

impl RowDiagnostic {
    /// Creates a diagnostic for the data row at zero-based `index`.
    #[must_use]
    pub const fn for_row(index: usize, errors: Vec<FieldError>) -> Self {
        Self {
            line: index + 2,
            errors,
        }
    }
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RowDiagnostic {}

/// What to do with a row that has unusable fields.
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
pub enum MalformedRowPolicy {
    /// Drop the row, log a warning, keep loading.
    #[default]
    Skip,
    /// Abort the whole load.
    Fail,
}

impl MalformedRowPolicy {
    /// Applies the policy to a rejected row of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedRow`] under [`MalformedRowPolicy::Fail`].
    pub fn reject(self, table: &str, diagnostic: RowDiagnostic) -> Result<(), SourceError> {
        match self {
            Self::Skip => {
                log::warn!("[{table}] skipping malformed row, {diagnostic}");
                Ok(())
            }
            Self::Fail => Err(SourceError::MalformedRow {
                table: table.to_owned(),
                diagnostic,
            }),
        }
    }
}

/// Parses a date cell.
///
/// # Errors
///
/// Returns [`FieldError::Missing`] for an empty cell and
/// [`FieldError::InvalidDate`] when the text does not match `format`.
pub fn parse_date(column: &str, value: &str, format: DateFormat) -> Result<NaiveDate, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Missing {
            column: column.to_owned(),
        });
    }
    NaiveDate::parse_from_str(value, format.pattern()).map_err(|_| FieldError::InvalidDate {
        column: column.to_owned(),
        value: value.to_owned(),
        format,
    })
}

/// Largest accepted count. Daily differences are signed, so counts stay
/// within `i64`.
#[allow(clippy::cast_sign_loss)]
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Parses a cumulative count cell.
///
/// # Errors
///
/// Returns [`FieldError::Missing`] for an empty cell and
/// [`FieldError::InvalidCount`] for anything that is not an integer in
/// `0..=MAX_COUNT`.
pub fn parse_count(column: &str, value: &str) -> Result<u64, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Missing {
            column: column.to_owned(),
        });
    }
    value
        .parse::<u64>()
        .ok()
        .filter(|&count| count <= MAX_COUNT)
        .ok_or_else(|| FieldError::InvalidCount {
            column: column.to_owned(),
            value: value.to_owned(),
        })
}

/// Records a failed parse into `errors` and returns the value on success.
pub fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
