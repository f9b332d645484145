//! Flat tabular export of a filtered view.
//!
//! Produces comma-separated UTF-8 text with a header row of canonical field
//! names, in a form the ingestion layer can read back losslessly (numbers
//! and timestamps round-trip barring textual formatting).

use tasklens_core::models::NormalizedRecord;

/// Canonical column order of the export, matching the normalized field
/// names.
pub const CANONICAL_HEADERS: [&str; 11] = [
    "user_key",
    "user_display_name",
    "locale",
    "project_id",
    "task_label",
    "duration_minutes",
    "start_timestamp",
    "date",
    "hour",
    "weekday_name",
    "week_period",
];

/// Render `view` as comma-separated text with a canonical header row.
///
/// Null fields become empty cells; cells containing commas, quotes or
/// newlines are double-quoted with `""` escapes.
pub fn to_csv(view: &[NormalizedRecord]) -> String {
    let mut out = String::new();
    out.push_str(&CANONICAL_HEADERS.join(","));
    out.push('\n');

    for record in view {
        let cells = [
            record.user_key.clone(),
            record.user_display_name.clone(),
            record.locale.clone().unwrap_or_default(),
            record.project_id.clone().unwrap_or_default(),
            record.task_label.clone(),
            record.duration_minutes.map(format_minutes).unwrap_or_default(),
            record
                .start_timestamp
                .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_default(),
            record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            record.hour.map(|h| h.to_string()).unwrap_or_default(),
            record.weekday_name.clone().unwrap_or_default(),
            record.week_period.clone().unwrap_or_default(),
        ];

        let line: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Format a minute count so it parses back to the same value: whole numbers
/// without a decimal point, everything else via the shortest float form.
fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 && minutes.abs() < 1e15 {
        format!("{}", minutes as i64)
    } else {
        minutes.to_string()
    }
}

fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
