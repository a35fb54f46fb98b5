//! Day-over-day differences of cumulative counts.

use covid_tracker_series_models::DailyRecord;

/// `today - yesterday`, saturated to the `i64` range.
fn delta(today: u64, yesterday: u64) -> i64 {
    let diff = i128::from(today) - i128::from(yesterday);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

/// Fills `new_cases` and `new_deaths` from the cumulative counts.
///
/// Input must be in ascending date order. The baseline before the first
/// record is zero, so the first record's deltas equal its cumulative
/// counts. Decreasing cumulative counts produce negative deltas.
///
/// Deltas are derived from the cumulative fields only, but the loader still
/// runs this exactly once per area per load.
#[must_use]
pub fn daily_differences(values: Vec<DailyRecord>) -> Vec<DailyRecord> {
    values
        .into_iter()
        .scan((0_u64, 0_u64), |(cases_yesterday, deaths_yesterday), mut day| {
            day.new_cases = delta(day.cases, *cases_yesterday);
            day.new_deaths = delta(day.deaths, *deaths_yesterday);
            *cases_yesterday = day.cases;
            *deaths_yesterday = day.deaths;
            Some(day)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn series(counts: &[(u64, u64)]) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        counts
            .iter()
            .zip(start.iter_days())
            .map(|(&(cases, deaths), date)| DailyRecord::new(date, cases, deaths))
            .collect()
    }

    #[test]
    fn differences_cumulative_cases() {
        let out = daily_differences(series(&[(10, 1), (25, 1), (25, 2), (40, 2)]));
        let new_cases: Vec<i64> = out.iter().map(|r| r.new_cases).collect();
        let new_deaths: Vec<i64> = out.iter().map(|r| r.new_deaths).collect();
        assert_eq!(new_cases, [10, 15, 0, 15]);
        assert_eq!(new_deaths, [1, 0, 1, 0]);
    }

    #[test]
    fn first_day_uses_zero_baseline() {
        let out = daily_differences(series(&[(5, 1)]));
        assert_eq!((out[0].new_cases, out[0].new_deaths), (5, 1));
    }

    #[test]
    fn corrections_go_negative() {
        let out = daily_differences(series(&[(10, 3), (8, 2)]));
        assert_eq!((out[1].new_cases, out[1].new_deaths), (-2, -1));
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let out = daily_differences(series(&[(1, 0), (u64::MAX, 0), (0, 0)]));
        let new_cases: Vec<i64> = out.iter().map(|r| r.new_cases).collect();
        assert_eq!(new_cases, [1, i64::MAX, i64::MIN]);
    }

    #[test]
    fn keeps_cumulative_fields_and_order() {
        let input = series(&[(1, 0), (3, 0)]);
        let out = daily_differences(input.clone());
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].date, input[1].date);
        assert_eq!(out[1].cases, 3);
    }

    #[test]
    fn empty_series_stays_empty() {
        assert!(daily_differences(Vec::new()).is_empty());
    }
}
