//! Source ingestion: schema normalization of heterogeneous uploaded rows.
//!
//! Each source is resolved once against the configured [`ColumnMap`]; a
//! source missing a required canonical field is rejected as a whole, while
//! row-level parse failures are recovered by nulling the affected field and
//! counting a warning. Nothing here is fatal to the process.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use tasklens_core::error::{Result, TasklensError};
use tasklens_core::mapping::{ColumnMap, ResolvedColumns};
use tasklens_core::models::{NormalizedRecord, RawRow};
use tasklens_core::temporal::{derive_features, TimestampParser};

// ── IngestReport ──────────────────────────────────────────────────────────────

/// The outcome of ingesting one source.
///
/// Row-level parse failures never abort a source; they surface only through
/// the warning counters here.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Name of the ingested source (file name or caller-supplied label).
    pub source: String,
    /// Normalized records, in source order. Records with nulled fields are
    /// retained.
    pub records: Vec<NormalizedRecord>,
    /// Number of data rows read from the source.
    pub rows_read: usize,
    /// Rows whose duration was unparseable or negative (nulled).
    pub duration_warnings: usize,
    /// Rows whose start timestamp was unparseable (temporal fields nulled).
    pub timestamp_warnings: usize,
}

impl IngestReport {
    /// Total number of row-level recoveries in this source.
    pub fn warning_count(&self) -> usize {
        self.duration_warnings + self.timestamp_warnings
    }
}

// ── SchemaNormalizer ──────────────────────────────────────────────────────────

/// Maps heterogeneous uploaded rows onto the canonical record shape.
pub struct SchemaNormalizer {
    map: ColumnMap,
}

impl SchemaNormalizer {
    /// Create a normalizer with the supplied column mapping.
    pub fn new(map: ColumnMap) -> Self {
        Self { map }
    }

    /// Create a normalizer with the default synonym set.
    pub fn with_defaults() -> Self {
        Self::new(ColumnMap::default())
    }

    /// The active column mapping.
    pub fn column_map(&self) -> &ColumnMap {
        &self.map
    }

    /// Normalize a source given its header set and data rows.
    ///
    /// Fails with [`TasklensError::SchemaMismatch`] when the headers lack a
    /// required canonical field; otherwise every row produces exactly one
    /// record, with unparseable fields nulled and counted.
    pub fn normalize_rows(
        &self,
        source: &str,
        headers: &[String],
        rows: &[RawRow],
    ) -> Result<IngestReport> {
        let cols = self.map.resolve(headers, source)?;

        let mut report = IngestReport {
            source: source.to_string(),
            records: Vec::with_capacity(rows.len()),
            rows_read: 0,
            duration_warnings: 0,
            timestamp_warnings: 0,
        };

        for row in rows {
            report.rows_read += 1;
            let record = self.normalize_row(
                row,
                &cols,
                &mut report.duration_warnings,
                &mut report.timestamp_warnings,
            );
            report.records.push(record);
        }

        debug!(
            "Ingested source \"{}\": {} rows, {} duration warnings, {} timestamp warnings",
            report.source, report.rows_read, report.duration_warnings, report.timestamp_warnings,
        );
        Ok(report)
    }

    /// Normalize rows whose header set is not known up front (e.g. JSON-ish
    /// input). Headers are taken as the union of all row keys, in first-seen
    /// order.
    pub fn normalize_mapped_rows(&self, source: &str, rows: &[RawRow]) -> Result<IngestReport> {
        let mut headers: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
        self.normalize_rows(source, &headers, rows)
    }

    /// Parse delimited text and normalize it in one step.
    pub fn normalize_csv(&self, source: &str, text: &str) -> Result<IngestReport> {
        let (headers, rows) = parse_csv(text);
        self.normalize_rows(source, &headers, &rows)
    }

    /// Read a delimited source file from disk and normalize it.
    pub fn load_file(&self, path: &Path) -> Result<IngestReport> {
        let text = std::fs::read_to_string(path).map_err(|e| TasklensError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.normalize_csv(&name, &text)
    }

    // ── Row-level normalization ───────────────────────────────────────────────

    fn normalize_row(
        &self,
        row: &RawRow,
        cols: &ResolvedColumns,
        duration_warnings: &mut usize,
        timestamp_warnings: &mut usize,
    ) -> NormalizedRecord {
        let (user_key, user_display_name) = derive_user(row, cols);

        let task_label = cols
            .task_label
            .as_deref()
            .and_then(|c| cell_str(row, c))
            .unwrap_or_default();

        let locale = cols.locale.as_deref().and_then(|c| cell_str(row, c));
        let project_id = cols.project_id.as_deref().and_then(|c| cell_str(row, c));

        let duration_minutes = match extract_duration(row, cols) {
            Ok(minutes) => minutes,
            Err(()) => {
                *duration_warnings += 1;
                None
            }
        };

        // Only a non-blank value that fails to parse is a row warning; a
        // blank cell or missing column is simply a dateless record.
        let start_timestamp = match cols.timestamp_column() {
            Some(col) => match row.get(col) {
                Some(value) if !is_blank(value) => {
                    let parsed = TimestampParser::parse(value);
                    if parsed.is_none() {
                        *timestamp_warnings += 1;
                    }
                    parsed
                }
                _ => None,
            },
            None => None,
        };

        let features = derive_features(start_timestamp);

        NormalizedRecord {
            user_key,
            user_display_name,
            locale,
            project_id,
            task_label,
            duration_minutes,
            start_timestamp,
            date: features.date,
            hour: features.hour,
            weekday_name: features.weekday_name,
            week_period: features.week_period,
        }
    }
}

// ── Field extraction helpers ──────────────────────────────────────────────────

/// Derive `(user_key, user_display_name)` from the resolved name columns.
///
/// A split first/last pair takes precedence over a single user column; a
/// dedicated display-name column overrides the computed display value.
fn derive_user(row: &RawRow, cols: &ResolvedColumns) -> (String, String) {
    let first = cols.first_name.as_deref().and_then(|c| cell_str(row, c));
    let last = cols.last_name.as_deref().and_then(|c| cell_str(row, c));
    let single = cols.user.as_deref().and_then(|c| cell_str(row, c));

    let (key, computed_display) = match (first, last) {
        (Some(f), Some(l)) => (
            format!("{}.{}", slugify(&f), slugify(&l)),
            format!("{} {}", f, l),
        ),
        (Some(f), None) => (slugify(&f), f),
        _ => match single {
            Some(u) => (slugify(&u), u),
            None => ("unknown".to_string(), "Unknown".to_string()),
        },
    };

    let display = cols
        .display_name
        .as_deref()
        .and_then(|c| cell_str(row, c))
        .unwrap_or(computed_display);

    (key, display)
}

/// Lowercase a name fragment and collapse internal whitespace to `.`,
/// producing a stable identifier.
fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
}

/// Extract the duration in minutes for one row.
///
/// `Ok(Some(minutes))` on success, `Ok(None)` when the source offers no
/// duration column at all for this row shape, `Err(())` when a value was
/// present but unparseable or negative (row-level warning).
fn extract_duration(row: &RawRow, cols: &ResolvedColumns) -> std::result::Result<Option<f64>, ()> {
    if let Some(col) = cols.minutes.as_deref() {
        let minutes = cell_f64(row, col).ok_or(())?;
        if minutes.is_finite() && minutes >= 0.0 {
            return Ok(Some(minutes));
        }
        // Negative durations are invalid, never clamped to zero.
        return Err(());
    }

    if let (Some(start_col), Some(end_col)) = (cols.start_time.as_deref(), cols.end_time.as_deref())
    {
        let start = cell_str(row, start_col).ok_or(())?;
        let end = cell_str(row, end_col).ok_or(())?;
        let minutes = duration_between(&start, &end).ok_or(())?;
        if minutes < 0.0 {
            warn!("negative duration from start/end pair (\"{}\" .. \"{}\")", start, end);
            return Err(());
        }
        return Ok(Some(minutes));
    }

    Ok(None)
}

/// Minutes elapsed between two clock values, signed.
///
/// Both cells must parse the same way: as full date-times, or as bare
/// times-of-day.
fn duration_between(start: &str, end: &str) -> Option<f64> {
    if let (Some(s), Some(e)) = (
        TimestampParser::parse_str(start),
        TimestampParser::parse_str(end),
    ) {
        return Some((e - s).num_seconds() as f64 / 60.0);
    }
    if let (Some(s), Some(e)) = (
        TimestampParser::parse_time_of_day(start),
        TimestampParser::parse_time_of_day(end),
    ) {
        return Some((e - s).num_seconds() as f64 / 60.0);
    }
    None
}

/// Read a cell as a trimmed, non-empty string.
fn cell_str(row: &RawRow, col: &str) -> Option<String> {
    match row.get(col)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a cell as a finite float, accepting numbers and numeric strings.
fn cell_f64(row: &RawRow, col: &str) -> Option<f64> {
    match row.get(col)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ── Delimited text parsing ────────────────────────────────────────────────────

/// Parse comma-separated text into a header row and data rows.
///
/// Handles RFC-style double-quoted fields (embedded commas, newlines, and
/// `""` escapes). All cells become JSON strings; numeric interpretation is
/// left to normalization.
pub fn parse_csv(text: &str) -> (Vec<String>, Vec<RawRow>) {
    let mut lines = split_records(text).into_iter();

    let headers: Vec<String> = match lines.next() {
        Some(header_fields) => header_fields,
        None => return (Vec::new(), Vec::new()),
    };

    let mut rows: Vec<RawRow> = Vec::new();
    for fields in lines {
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = fields.get(i).cloned().unwrap_or_default();
            row.insert(header.clone(), Value::String(cell));
        }
        rows.push(row);
    }

    (headers, rows)
}

/// Split delimited text into records of fields, honouring quoting.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut saw_any = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        saw_any = true;
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut field));
                }
                '\r' => {} // swallow, the '\n' ends the record
                '\n' => {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                _ => field.push(c),
            }
        }
    }

    // Trailing record without a final newline.
    if saw_any && (!field.is_empty() || !fields.is_empty()) {
        fields.push(field);
        records.push(fields);
    }

    // Drop fully blank records (e.g. a trailing empty line).
    records
        .into_iter()
        .filter(|r| !(r.len() == 1 && r[0].is_empty()))
        .collect()
}

// ── Source file discovery ─────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_source_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Source path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── Tests ─────────────────────────────────────────────────────────────────────
