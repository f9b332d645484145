//! Multi-dimensional filtering of the normalized dataset.
//!
//! A filtered view is a fresh, order-preserving copy of the matching
//! records; the underlying dataset is never mutated.

use tasklens_core::models::{FilterCriteria, NormalizedRecord};

/// Apply `criteria` to `dataset`, producing a filtered view.
///
/// Each dimension matches independently and combines by logical AND; the
/// original record order is preserved. Because every input is immutable and
/// this function is pure, callers may memoize results keyed on (dataset
/// identity, criteria).
pub fn apply(dataset: &[NormalizedRecord], criteria: &FilterCriteria) -> Vec<NormalizedRecord> {
    dataset
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tasklens_core::models::{DateRange, Selection};

    fn record(user: &str, locale: &str, date: Option<(i32, u32, u32)>) -> NormalizedRecord {
        NormalizedRecord {
            user_key: user.to_string(),
            user_display_name: user.to_string(),
            locale: Some(locale.to_string()),
            project_id: None,
            task_label: "task".to_string(),
            duration_minutes: Some(10.0),
            start_timestamp: None,
            date: date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            hour: None,
            weekday_name: None,
            week_period: None,
        }
    }

    fn dataset() -> Vec<NormalizedRecord> {
        vec![
            record("alice", "en-US", Some((2024, 1, 10))),
            record("bob", "de-DE", Some((2024, 1, 15))),
            record("alice", "en-US", Some((2024, 1, 20))),
            record("carol", "fr-FR", None), // unscheduled
        ]
    }

    #[test]
    fn test_all_inclusive_criteria_return_identical_view() {
        let data = dataset();
        let view = apply(&data, &FilterCriteria::default());
        assert_eq!(view, data);
    }

    #[test]
    fn test_empty_user_set_returns_zero_records() {
        let data = dataset();
        let criteria = FilterCriteria {
            users: Selection::only(Vec::<String>::new()),
            ..FilterCriteria::default()
        };
        assert!(apply(&data, &criteria).is_empty());
    }

    #[test]
    fn test_user_filter_preserves_order() {
        let data = dataset();
        let criteria = FilterCriteria {
            users: Selection::only(["alice"]),
            ..FilterCriteria::default()
        };
        let view = apply(&data, &criteria);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(view[1].date, NaiveDate::from_ymd_opt(2024, 1, 20));
    }

    #[test]
    fn test_date_range_excludes_null_dates() {
        let data = dataset();
        let criteria = FilterCriteria {
            dates: DateRange::Between(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ),
            ..FilterCriteria::default()
        };
        let view = apply(&data, &criteria);
        // carol has no date and cannot satisfy a concrete range.
        assert_eq!(view.len(), 3);
        assert!(view.iter().all(|r| r.date.is_some()));
    }

    #[test]
    fn test_dimensions_combine_with_and() {
        let data = dataset();
        let criteria = FilterCriteria {
            users: Selection::only(["alice", "bob"]),
            locales: Selection::only(["de-DE"]),
            ..FilterCriteria::default()
        };
        let view = apply(&data, &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].user_key, "bob");
    }

    #[test]
    fn test_filter_does_not_mutate_dataset() {
        let data = dataset();
        let before = data.clone();
        let _ = apply(&data, &FilterCriteria::default());
        assert_eq!(data, before);
    }
}
