//! Dense 2D pivot matrices over derived dimensions.

use serde::Serialize;
use tasklens_core::models::{NormalizedRecord, WEEKDAY_NAMES};

// ── Dimension ─────────────────────────────────────────────────────────────────

/// A derived dimension with a fixed, fully-enumerated domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Hour of day, 0–23.
    Hour,
    /// Weekday, Monday→Sunday.
    Weekday,
}

impl Dimension {
    /// The full domain of the dimension, as axis labels.
    pub fn domain(&self) -> Vec<String> {
        match self {
            Dimension::Hour => (0..24).map(|h| format!("{:02}", h)).collect(),
            Dimension::Weekday => WEEKDAY_NAMES.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Index of `record` within the domain, or `None` when the underlying
    /// derived field is null.
    fn index_of(&self, record: &NormalizedRecord) -> Option<usize> {
        match self {
            Dimension::Hour => record.hour.map(|h| h as usize),
            Dimension::Weekday => record
                .weekday_name
                .as_deref()
                .and_then(|name| WEEKDAY_NAMES.iter().position(|d| *d == name)),
        }
    }
}

// ── HeatmapMatrix ─────────────────────────────────────────────────────────────

/// A dense pivot table summing minutes over two derived dimensions.
///
/// Every cell of the full domain product is present; cells with no matching
/// records are explicitly zero.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapMatrix {
    /// Labels of the row dimension, in domain order.
    pub row_labels: Vec<String>,
    /// Labels of the column dimension, in domain order.
    pub col_labels: Vec<String>,
    /// `cells[row][col]` = summed minutes.
    pub cells: Vec<Vec<f64>>,
}

impl HeatmapMatrix {
    /// The value at (`row`, `col`), if in range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)?.get(col).copied()
    }
}

// ── HeatmapBuilder ────────────────────────────────────────────────────────────

/// Builds dense 2D pivot matrices from a view.
pub struct HeatmapBuilder;

impl HeatmapBuilder {
    /// Sum `duration_minutes` into a dense `rows` × `cols` matrix.
    ///
    /// Records with a null value in either dimension, or a null duration,
    /// contribute nothing.
    pub fn build(view: &[NormalizedRecord], rows: Dimension, cols: Dimension) -> HeatmapMatrix {
        let row_labels = rows.domain();
        let col_labels = cols.domain();
        let mut cells = vec![vec![0.0; col_labels.len()]; row_labels.len()];

        for record in view {
            let (Some(r), Some(c)) = (rows.index_of(record), cols.index_of(record)) else {
                continue;
            };
            if let Some(minutes) = record.duration_minutes {
                cells[r][c] += minutes;
            }
        }

        HeatmapMatrix {
            row_labels,
            col_labels,
            cells,
        }
    }

    /// The standard hour-of-day × weekday pivot.
    pub fn hour_by_weekday(view: &[NormalizedRecord]) -> HeatmapMatrix {
        Self::build(view, Dimension::Hour, Dimension::Weekday)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
