//! Grouping of long-format rows into areas.

use std::collections::HashMap;

use covid_tracker_series_models::{Area, AreaKind, DailyRecord};

/// Groups rows by derived key into one [`Area`] per distinct key.
///
/// Areas appear in the order their key is first seen; each area keeps its
/// rows in source order. Nothing is sorted, and rows from distinct
/// entities that derive the same key end up in the same area.
pub fn partition<T>(
    rows: impl IntoIterator<Item = T>,
    kind: AreaKind,
    key: impl Fn(&T) -> String,
    record: impl Fn(T) -> DailyRecord,
) -> Vec<Area> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut areas: Vec<Area> = Vec::new();

    for row in rows {
        let area_key = key(&row);
        let daily = record(row);

        if let Some(&index) = positions.get(&area_key) {
            areas[index].values.push(daily);
        } else {
            positions.insert(area_key.clone(), areas.len());
            areas.push(Area::new(area_key, kind, vec![daily]));
        }
    }

    areas
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(state: &str, day: u32, cases: u64) -> (String, NaiveDate, u64) {
        (
            state.to_owned(),
            NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
            cases,
        )
    }

    fn split(rows: Vec<(String, NaiveDate, u64)>) -> Vec<Area> {
        partition(
            rows,
            AreaKind::UsState,
            |(state, _, _)| state.clone(),
            |(_, date, cases)| DailyRecord::new(date, cases, 0),
        )
    }

    #[test]
    fn keeps_first_seen_key_order_and_row_order() {
        let areas = split(vec![
            row("Washington", 1, 1),
            row("Illinois", 1, 2),
            row("Washington", 2, 3),
            row("Illinois", 2, 4),
        ]);

        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].key, "Washington");
        assert_eq!(areas[1].key, "Illinois");
        let cases: Vec<u64> = areas[0].values.iter().map(|r| r.cases).collect();
        assert_eq!(cases, [1, 3]);
    }

    #[test]
    fn does_not_sort_rows() {
        let areas = split(vec![row("Ohio", 2, 5), row("Ohio", 1, 3)]);
        assert!(!areas[0].is_chronological());
    }

    #[test]
    fn colliding_keys_merge() {
        let areas = split(vec![row("", 1, 1), row("", 1, 2)]);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].values.len(), 2);
    }

    #[test]
    fn no_rows_no_areas() {
        assert!(split(Vec::new()).is_empty());
    }
}
