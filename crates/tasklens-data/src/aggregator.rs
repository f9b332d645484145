//! Grouped aggregation over filtered views.
//!
//! Every aggregation recomputes from the immutable view it is given;
//! results are ephemeral and safe to memoize by the caller.

use std::collections::BTreeMap;

use serde::Serialize;
use tasklens_core::models::NormalizedRecord;

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Which metric drives the ordering of an aggregation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Sum,
    Mean,
    Count,
}

/// How the result rows are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// By grouping key, ascending (the default).
    KeyAscending,
    /// By the requested metric, descending — for top-N style consumers.
    ValueDescending,
}

/// Duration metrics for one group.
///
/// Records with a null duration contribute to `count` (a task was still
/// logged) but never to `sum` or `mean`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetrics {
    /// Sum of non-null durations, in minutes.
    pub sum: f64,
    /// Mean of non-null durations; `None` when the group has none.
    pub mean: Option<f64>,
    /// Number of records in the group, null durations included.
    pub count: u32,
}

impl GroupMetrics {
    /// The value of the requested metric, for ordering. A missing mean
    /// sorts below every concrete value.
    fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sum => self.sum,
            Metric::Mean => self.mean.unwrap_or(f64::NEG_INFINITY),
            Metric::Count => self.count as f64,
        }
    }
}

/// One row of an aggregation result: the grouping-key tuple plus all three
/// metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationRow {
    /// The grouping key, one element per grouped dimension.
    pub key: Vec<String>,
    /// Metrics for this group.
    pub metrics: GroupMetrics,
}

/// An ordered aggregation result.
pub type AggregationResult = Vec<AggregationRow>;

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Accumulator {
    sum: f64,
    duration_count: u32,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, record: &NormalizedRecord) {
        self.count += 1;
        if let Some(minutes) = record.duration_minutes {
            self.sum += minutes;
            self.duration_count += 1;
        }
    }

    fn finish(self) -> GroupMetrics {
        GroupMetrics {
            sum: self.sum,
            mean: (self.duration_count > 0).then(|| self.sum / self.duration_count as f64),
            count: self.count,
        }
    }
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Stateless grouping and reduction over a view.
pub struct AggregationEngine;

impl AggregationEngine {
    /// Generic aggregation driver.
    ///
    /// `key_fn` maps a record to its grouping-key tuple, or `None` to
    /// exclude the record from this aggregation (e.g. a null derived
    /// dimension). `metric` selects the value that `order` sorts on; all
    /// three metrics are computed for every group regardless.
    pub fn group_by(
        view: &[NormalizedRecord],
        key_fn: impl Fn(&NormalizedRecord) -> Option<Vec<String>>,
        metric: Metric,
        order: SortOrder,
    ) -> AggregationResult {
        // BTreeMap gives key-ascending order for free.
        let mut groups: BTreeMap<Vec<String>, Accumulator> = BTreeMap::new();
        for record in view {
            if let Some(key) = key_fn(record) {
                groups.entry(key).or_default().add(record);
            }
        }

        let mut rows: Vec<AggregationRow> = groups
            .into_iter()
            .map(|(key, acc)| AggregationRow {
                key,
                metrics: acc.finish(),
            })
            .collect();

        if order == SortOrder::ValueDescending {
            rows.sort_by(|a, b| {
                b.metrics
                    .value(metric)
                    .partial_cmp(&a.metrics.value(metric))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        rows
    }

    /// Total minutes per `user_key`.
    pub fn per_user(view: &[NormalizedRecord], order: SortOrder) -> AggregationResult {
        Self::group_by(view, |r| Some(vec![r.user_key.clone()]), Metric::Sum, order)
    }

    /// Total minutes per task label.
    pub fn per_task(view: &[NormalizedRecord], order: SortOrder) -> AggregationResult {
        Self::group_by(view, |r| Some(vec![r.task_label.clone()]), Metric::Sum, order)
    }

    /// Total minutes per calendar day. Records with a null date are
    /// excluded.
    pub fn per_date(view: &[NormalizedRecord], order: SortOrder) -> AggregationResult {
        Self::group_by(
            view,
            |r| r.date.map(|d| vec![d.format("%Y-%m-%d").to_string()]),
            Metric::Sum,
            order,
        )
    }

    /// Total minutes per hour of day (keys `"00"`–`"23"`). Records with a
    /// null hour are excluded.
    pub fn per_hour(view: &[NormalizedRecord], order: SortOrder) -> AggregationResult {
        Self::group_by(
            view,
            |r| r.hour.map(|h| vec![format!("{:02}", h)]),
            Metric::Sum,
            order,
        )
    }

    /// Total minutes per (user, task) pair.
    pub fn per_user_task(view: &[NormalizedRecord], order: SortOrder) -> AggregationResult {
        Self::group_by(
            view,
            |r| Some(vec![r.user_key.clone(), r.task_label.clone()]),
            Metric::Sum,
            order,
        )
    }

    /// Keep only the first `n` rows of a result (combine with
    /// [`SortOrder::ValueDescending`] for top-N consumers).
    pub fn top_n(mut result: AggregationResult, n: usize) -> AggregationResult {
        result.truncate(n);
        result
    }

    /// Whole-view summary metrics.
    pub fn summary(view: &[NormalizedRecord]) -> Summary {
        let mut acc = Accumulator::default();
        for record in view {
            acc.add(record);
        }
        let metrics = acc.finish();
        Summary {
            total_minutes: metrics.sum,
            mean_minutes: metrics.mean,
            task_count: metrics.count,
        }
    }
}

/// The headline metrics of a view: total time, average time per task, and
/// task count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_minutes: f64,
    pub mean_minutes: Option<f64>,
    pub task_count: u32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tasklens_core::temporal::{derive_features, TimestampParser};

    fn record(user: &str, task: &str, minutes: Option<f64>, ts: Option<&str>) -> NormalizedRecord {
        let start_timestamp = ts.and_then(TimestampParser::parse_str);
        let features = derive_features(start_timestamp);
        NormalizedRecord {
            user_key: user.to_string(),
            user_display_name: user.to_string(),
            locale: None,
            project_id: None,
            task_label: task.to_string(),
            duration_minutes: minutes,
            start_timestamp,
            date: features.date,
            hour: features.hour,
            weekday_name: features.weekday_name,
            week_period: features.week_period,
        }
    }

    fn view() -> Vec<NormalizedRecord> {
        vec![
            record("alice", "review", Some(30.0), Some("2024-01-15T09:00:00")),
            record("bob", "standup", Some(15.0), Some("2024-01-15T10:00:00")),
            record("alice", "coding", Some(60.0), Some("2024-01-16T14:00:00")),
            record("bob", "standup", None, None), // null duration, unscheduled
        ]
    }

    // ── group_by ──────────────────────────────────────────────────────────────

    #[test]
    fn test_per_user_sums_and_key_order() {
        let rows = AggregationEngine::per_user(&view(), SortOrder::KeyAscending);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec!["alice"]);
        assert_eq!(rows[0].metrics.sum, 90.0);
        assert_eq!(rows[1].key, vec!["bob"]);
        assert_eq!(rows[1].metrics.sum, 15.0);
    }

    #[test]
    fn test_per_user_totals_equal_view_total() {
        // Σ(per-user sums) must equal Σ(duration over the view), nulls ignored.
        let data = view();
        let view_total: f64 = data.iter().filter_map(|r| r.duration_minutes).sum();
        let per_user_total: f64 = AggregationEngine::per_user(&data, SortOrder::KeyAscending)
            .iter()
            .map(|row| row.metrics.sum)
            .sum();
        assert!((view_total - per_user_total).abs() < 1e-9);
    }

    #[test]
    fn test_null_duration_excluded_from_sum_and_mean_but_counted() {
        let rows = AggregationEngine::per_user(&view(), SortOrder::KeyAscending);
        let bob = &rows[1];
        assert_eq!(bob.metrics.count, 2); // both logged tasks count
        assert_eq!(bob.metrics.sum, 15.0); // null excluded from sum
        assert_eq!(bob.metrics.mean, Some(15.0)); // and from mean
    }

    #[test]
    fn test_all_null_group_has_no_mean() {
        let data = vec![record("carol", "misc", None, None)];
        let rows = AggregationEngine::per_user(&data, SortOrder::KeyAscending);
        assert_eq!(rows[0].metrics.mean, None);
        assert_eq!(rows[0].metrics.sum, 0.0);
        assert_eq!(rows[0].metrics.count, 1);
    }

    #[test]
    fn test_value_descending_order() {
        let rows = AggregationEngine::per_user(&view(), SortOrder::ValueDescending);
        assert_eq!(rows[0].key, vec!["alice"]); // 90 > 15
        assert_eq!(rows[1].key, vec!["bob"]);
    }

    #[test]
    fn test_top_n_truncates() {
        let rows = AggregationEngine::per_user(&view(), SortOrder::ValueDescending);
        let top = AggregationEngine::top_n(rows, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, vec!["alice"]);
    }

    #[test]
    fn test_empty_view_yields_empty_result() {
        let rows = AggregationEngine::per_user(&[], SortOrder::KeyAscending);
        assert!(rows.is_empty());
    }

    // ── Standard aggregations ─────────────────────────────────────────────────

    #[test]
    fn test_per_date_excludes_null_dates() {
        let rows = AggregationEngine::per_date(&view(), SortOrder::KeyAscending);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec!["2024-01-15"]);
        assert_eq!(rows[0].metrics.sum, 45.0);
        assert_eq!(rows[1].key, vec!["2024-01-16"]);
    }

    #[test]
    fn test_per_hour_keys_zero_padded_and_sorted() {
        let data = vec![
            record("a", "t", Some(5.0), Some("2024-01-15T14:00:00")),
            record("a", "t", Some(5.0), Some("2024-01-15T09:00:00")),
        ];
        let rows = AggregationEngine::per_hour(&data, SortOrder::KeyAscending);
        assert_eq!(rows[0].key, vec!["09"]);
        assert_eq!(rows[1].key, vec!["14"]);
    }

    #[test]
    fn test_per_user_task_cross_aggregation() {
        let rows = AggregationEngine::per_user_task(&view(), SortOrder::KeyAscending);
        let keys: Vec<&Vec<String>> = rows.iter().map(|r| &r.key).collect();
        assert!(keys.contains(&&vec!["alice".to_string(), "review".to_string()]));
        assert!(keys.contains(&&vec!["bob".to_string(), "standup".to_string()]));
        assert_eq!(rows.len(), 3);
    }

    // ── summary ───────────────────────────────────────────────────────────────

    #[test]
    fn test_summary_metrics() {
        let summary = AggregationEngine::summary(&view());
        assert_eq!(summary.total_minutes, 105.0);
        assert_eq!(summary.task_count, 4);
        assert_eq!(summary.mean_minutes, Some(35.0));
    }

    #[test]
    fn test_summary_empty_view() {
        let summary = AggregationEngine::summary(&[]);
        assert_eq!(summary.total_minutes, 0.0);
        assert_eq!(summary.task_count, 0);
        assert_eq!(summary.mean_minutes, None);
    }

    #[test]
    fn test_per_date_key_format() {
        let data = vec![record("a", "t", Some(5.0), Some("2024-03-05T08:00:00"))];
        let rows = AggregationEngine::per_date(&data, SortOrder::KeyAscending);
        assert_eq!(rows[0].key, vec!["2024-03-05"]);
        let _ = NaiveDate::parse_from_str(&rows[0].key[0], "%Y-%m-%d").unwrap();
    }
}
