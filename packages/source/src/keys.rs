//! Area key derivation.
//!
//! Keys are the grouping key for partitioning and the join key for
//! population enrichment. World keys and [`KeyFormat::Qualified`] US keys
//! follow the population table's `Combined_Key` convention:
//! most-specific part first, parts joined with `", "`.

use covid_tracker_series_models::KeyFormat;

use crate::states::state_abbr;

/// Country suffix appended to qualified US keys.
pub const US_SUFFIX: &str = "US";

/// Outcome of looking a state name up in the abbreviation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAbbreviation<'a> {
    /// The name is known; holds its postal abbreviation.
    Matched(&'static str),
    /// The name is not in the table; holds the name unchanged.
    Unmatched(&'a str),
}

impl StateAbbreviation<'_> {
    /// The abbreviation, or the original name when unmatched.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match *self {
            Self::Matched(abbr) => abbr,
            Self::Unmatched(name) => name,
        }
    }
}

/// Looks up the postal abbreviation for a full state name.
#[must_use]
pub fn abbreviate_state(name: &str) -> StateAbbreviation<'_> {
    state_abbr(name).map_or(StateAbbreviation::Unmatched(name), StateAbbreviation::Matched)
}

/// Key for a row of the US states table.
#[must_use]
pub fn state_key(state: &str, format: KeyFormat) -> String {
    match format {
        KeyFormat::Abbreviated => state.to_owned(),
        KeyFormat::Qualified => format!("{state}, {US_SUFFIX}"),
    }
}

/// Key for a row of the US counties table.
#[must_use]
pub fn county_key(county: &str, state: &str, format: KeyFormat) -> String {
    match format {
        KeyFormat::Abbreviated => format!("{county}, {}", abbreviate_state(state).as_str()),
        KeyFormat::Qualified => format!("{county}, {state}, {US_SUFFIX}"),
    }
}

/// Key for a row of the world tables: the non-empty parts of
/// `[province, country]` joined with `", "`.
#[must_use]
pub fn world_key(province: &str, country: &str) -> String {
    [province, country]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
