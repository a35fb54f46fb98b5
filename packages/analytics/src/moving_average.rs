//! Trailing moving averages of daily differences.

use std::num::NonZeroUsize;

use covid_tracker_series_models::DailyRecord;

/// Default number of trailing days averaged.
pub const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(7) {
    Some(window) => window,
    None => unreachable!(),
};

/// Fills `moving_new_cases` and `moving_new_deaths`.
///
/// The value at position `i` is the mean of `new_x` over positions
/// `[i + 1 - window, i]`, clamped at the start of the series, so the first
/// days average over fewer than `window` values instead of dividing by the
/// full window. Run after [`crate::differences::daily_differences`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn moving_averages(values: Vec<DailyRecord>, window: NonZeroUsize) -> Vec<DailyRecord> {
    let window = window.get();
    let new_cases: Vec<i64> = values.iter().map(|r| r.new_cases).collect();
    let new_deaths: Vec<i64> = values.iter().map(|r| r.new_deaths).collect();

    let mut sum_cases: i128 = 0;
    let mut sum_deaths: i128 = 0;

    values
        .into_iter()
        .enumerate()
        .map(|(i, mut day)| {
            sum_cases += i128::from(new_cases[i]);
            sum_deaths += i128::from(new_deaths[i]);
            if i >= window {
                sum_cases -= i128::from(new_cases[i - window]);
                sum_deaths -= i128::from(new_deaths[i - window]);
            }

            let count = (i + 1).min(window) as f64;
            day.moving_new_cases = Some(sum_cases as f64 / count);
            day.moving_new_deaths = Some(sum_deaths as f64 / count);
            day
        })
        .collect()
}
