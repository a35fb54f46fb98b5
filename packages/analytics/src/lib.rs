#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived per-day statistics for area time series.
//!
//! Each step is a pure function from an owned series to a new, decorated
//! series: [`differences`] fills the daily deltas, [`moving_average`] the
//! trailing averages of those deltas, and [`population`] joins a static
//! population figure by area key.

pub mod differences;
pub mod moving_average;
pub mod population;

use std::num::NonZeroUsize;

use covid_tracker_series_models::Area;

use crate::differences::daily_differences;
use crate::moving_average::moving_averages;

/// Computes daily differences and, when `window` is set, moving averages
/// for one area.
#[must_use]
pub fn decorate(mut area: Area, window: Option<NonZeroUsize>) -> Area {
    let values = daily_differences(std::mem::take(&mut area.values));
    area.values = match window {
        Some(window) => moving_averages(values, window),
        None => values,
    };
    area
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use covid_tracker_series_models::{AreaKind, DailyRecord};

    use super::*;
    use crate::moving_average::DEFAULT_WINDOW;

    fn area() -> Area {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let values = [10, 25, 25, 40]
            .into_iter()
            .zip(start.iter_days())
            .map(|(cases, date)| DailyRecord::new(date, cases, 0))
            .collect();
        Area::new("Washington, US", AreaKind::UsState, values)
    }

    #[test]
    fn decorates_deltas_then_averages() {
        let out = decorate(area(), Some(DEFAULT_WINDOW));
        let new_cases: Vec<i64> = out.values.iter().map(|r| r.new_cases).collect();
        assert_eq!(new_cases, [10, 15, 0, 15]);
        assert_eq!(out.values[3].moving_new_cases, Some(10.0));
    }

    #[test]
    fn skips_averages_without_window() {
        let out = decorate(area(), None);
        assert_eq!(out.values[1].new_cases, 15);
        assert!(out.values.iter().all(|r| r.moving_new_cases.is_none()));
    }
}
