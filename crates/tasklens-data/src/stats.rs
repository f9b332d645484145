//! IQR-based outlier detection over duration values.

use serde::Serialize;
use tasklens_core::models::NormalizedRecord;

// ── Quantile helper ───────────────────────────────────────────────────────────

/// Compute the `p`-quantile (`p` in `[0, 1]`) of a **sorted** slice using
/// standard linear interpolation: the value at rank `(n-1)·p`, interpolated
/// between the adjacent sorted values (the same algorithm used by NumPy's
/// `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn quantile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = p * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

// ── OutlierReport ─────────────────────────────────────────────────────────────

/// The IQR band and the records falling strictly outside it.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    /// `Q1 − 1.5·IQR`. `None` when fewer than two non-null durations exist.
    pub lower_bound: Option<f64>,
    /// `Q3 + 1.5·IQR`. `None` when fewer than two non-null durations exist.
    pub upper_bound: Option<f64>,
    /// Records whose duration lies strictly outside `[lower, upper]`, in
    /// view order.
    pub outliers: Vec<NormalizedRecord>,
}

// ── OutlierDetector ───────────────────────────────────────────────────────────

/// Flags duration values outside the 1.5·IQR band.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Detect outliers in `view`.
    ///
    /// Null durations are ignored. With fewer than two non-null values the
    /// quartiles are undefined: both bounds are `None` and the outlier set
    /// is empty.
    pub fn detect(view: &[NormalizedRecord]) -> OutlierReport {
        let mut durations: Vec<f64> = view.iter().filter_map(|r| r.duration_minutes).collect();

        if durations.len() < 2 {
            return OutlierReport {
                lower_bound: None,
                upper_bound: None,
                outliers: Vec::new(),
            };
        }

        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = quantile(&durations, 0.25);
        let q3 = quantile(&durations, 0.75);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;

        let outliers = view
            .iter()
            .filter(|r| {
                r.duration_minutes
                    .map(|d| d < lower || d > upper)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        OutlierReport {
            lower_bound: Some(lower),
            upper_bound: Some(upper),
            outliers,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(minutes: Option<f64>) -> NormalizedRecord {
        NormalizedRecord {
            user_key: "user".to_string(),
            user_display_name: "User".to_string(),
            locale: None,
            project_id: None,
            task_label: "task".to_string(),
            duration_minutes: minutes,
            start_timestamp: None,
            date: None,
            hour: None,
            weekday_name: None,
            week_period: None,
        }
    }

    fn view(durations: &[f64]) -> Vec<NormalizedRecord> {
        durations.iter().map(|&d| record(Some(d))).collect()
    }

    // ── quantile ──────────────────────────────────────────────────────────────

    #[test]
    fn test_quantile_empty_returns_zero() {
        assert_eq!(quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_quantile_single_element() {
        assert_eq!(quantile(&[42.0], 0.25), 42.0);
        assert_eq!(quantile(&[42.0], 0.75), 42.0);
    }

    #[test]
    fn test_quantile_median_even_count() {
        // rank = 0.5 * 3 = 1.5 → interpolate between 2 and 3.
        assert!((quantile(&[1.0, 2.0, 3.0, 4.0], 0.5) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_endpoints() {
        let data = [10.0, 20.0, 30.0];
        assert_eq!(quantile(&data, 0.0), 10.0);
        assert_eq!(quantile(&data, 1.0), 30.0);
    }

    #[test]
    fn test_quantile_quartiles_of_four() {
        let data = [1.0, 2.0, 3.0, 100.0];
        // rank = 0.25 * 3 = 0.75 → 1 + 0.75 * (2 - 1) = 1.75
        assert!((quantile(&data, 0.25) - 1.75).abs() < 1e-9);
        // rank = 0.75 * 3 = 2.25 → 3 + 0.25 * (100 - 3) = 27.25
        assert!((quantile(&data, 0.75) - 27.25).abs() < 1e-9);
    }

    // ── OutlierDetector ───────────────────────────────────────────────────────

    #[test]
    fn test_detect_bounds_four_values() {
        let report = OutlierDetector::detect(&view(&[1.0, 2.0, 3.0, 100.0]));
        // Q1 = 1.75, Q3 = 27.25, IQR = 25.5.
        let lower = report.lower_bound.unwrap();
        let upper = report.upper_bound.unwrap();
        assert!((lower - (1.75 - 1.5 * 25.5)).abs() < 1e-9);
        assert!((upper - (27.25 + 1.5 * 25.5)).abs() < 1e-9);
        // 100 > 65.5, so it falls outside the band.
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(report.outliers[0].duration_minutes, Some(100.0));
    }

    #[test]
    fn test_detect_flags_extreme_value_exactly() {
        // Sorted: [1, 1, 2, 2, 3, 3, 1000].
        let report = OutlierDetector::detect(&view(&[1.0, 2.0, 3.0, 3.0, 2.0, 1.0, 1000.0]));
        // Q1 at rank 1.5 → 1.5; Q3 at rank 4.5 → 3.0; IQR = 1.5.
        assert!((report.lower_bound.unwrap() - (1.5 - 2.25)).abs() < 1e-9);
        assert!((report.upper_bound.unwrap() - (3.0 + 2.25)).abs() < 1e-9);
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(report.outliers[0].duration_minutes, Some(1000.0));
    }

    #[test]
    fn test_detect_boundary_values_are_not_outliers() {
        // All values identical: IQR = 0, bounds collapse onto the value.
        // Strictly-outside means none is flagged.
        let report = OutlierDetector::detect(&view(&[10.0, 10.0, 10.0]));
        assert_eq!(report.lower_bound, Some(10.0));
        assert_eq!(report.upper_bound, Some(10.0));
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_detect_fewer_than_two_values_undefined() {
        let report = OutlierDetector::detect(&view(&[42.0]));
        assert_eq!(report.lower_bound, None);
        assert_eq!(report.upper_bound, None);
        assert!(report.outliers.is_empty());

        let report = OutlierDetector::detect(&[]);
        assert_eq!(report.lower_bound, None);
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_detect_ignores_null_durations() {
        let mut data = view(&[10.0]);
        data.push(record(None));
        data.push(record(None));
        // Only one non-null value: still undefined.
        let report = OutlierDetector::detect(&data);
        assert_eq!(report.lower_bound, None);
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_detect_preserves_view_order_in_outliers() {
        // Sorted: [1, 1, 2, 2, 3, 3, 900, 1000] → Q1 = 1.75, Q3 = 227.25,
        // upper = 565.5; both extremes are flagged, in view order.
        let report =
            OutlierDetector::detect(&view(&[900.0, 1.0, 2.0, 3.0, 3.0, 2.0, 1.0, 1000.0]));
        let flagged: Vec<f64> = report
            .outliers
            .iter()
            .filter_map(|r| r.duration_minutes)
            .collect();
        assert_eq!(flagged, vec![900.0, 1000.0]);
    }
}
