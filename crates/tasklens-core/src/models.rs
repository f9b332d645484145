use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An uploaded row exactly as it arrived: an opaque column-name → value map.
///
/// Values may be JSON strings or numbers depending on the source; the
/// normalizer probes both.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// The seven weekday names, in calendar order (Monday first).
///
/// This is the fixed domain used for `weekday_name` and for the weekday axis
/// of heatmap matrices.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A single time-tracking record after column mapping and feature derivation.
///
/// Records are created once during ingestion and never mutated afterwards;
/// every downstream computation works on read-only views of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Stable user identifier derived from the source's name field(s),
    /// e.g. `"jane.doe"`.
    pub user_key: String,
    /// User name with the source's original casing, for display.
    pub user_display_name: String,
    /// Locale of the user, when the source carries one.
    #[serde(default)]
    pub locale: Option<String>,
    /// Project the task belongs to, when the source carries one.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Free-text label of the logged task.
    pub task_label: String,
    /// Logged duration in minutes. `None` when the source value was
    /// unparseable or negative; such records stay in the dataset but are
    /// excluded from sums and means.
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    /// Naive start timestamp as found in the source. No timezone conversion
    /// is ever applied.
    #[serde(default)]
    pub start_timestamp: Option<NaiveDateTime>,
    /// Calendar day of `start_timestamp`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Hour of day (0–23) of `start_timestamp`.
    #[serde(default)]
    pub hour: Option<u32>,
    /// English weekday name of `start_timestamp`, one of [`WEEKDAY_NAMES`].
    #[serde(default)]
    pub weekday_name: Option<String>,
    /// ISO-week label of `start_timestamp`, e.g. `"2024-W03"`.
    #[serde(default)]
    pub week_period: Option<String>,
}

// ── Filter criteria ───────────────────────────────────────────────────────────

/// A per-dimension selection: either everything, or an explicit set of
/// permitted values.
///
/// An explicitly empty set matches nothing — "no selection" means "show
/// nothing", never "show everything".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Dimension is unrestricted.
    All,
    /// Only the listed values match.
    Only(BTreeSet<String>),
}

impl Selection {
    /// Build an `Only` selection from any iterable of values.
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    /// Whether `value` passes this selection.
    ///
    /// A record missing the dimension entirely (`None`) matches only `All`:
    /// an explicit selection enumerates concrete values and can never name
    /// an absent one.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => value.map(|v| set.contains(v)).unwrap_or(false),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::All
    }
}

/// An inclusive calendar-date range, or no restriction at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    /// No date restriction.
    All,
    /// Dates within `[start, end]`, inclusive on both ends.
    Between(NaiveDate, NaiveDate),
}

impl DateRange {
    /// Whether `date` falls inside the range.
    ///
    /// A record with no derived date matches only the unrestricted default —
    /// it can never satisfy a concrete range.
    pub fn matches(&self, date: Option<NaiveDate>) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Between(start, end) => match date {
                Some(d) => d >= *start && d <= *end,
                None => false,
            },
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        DateRange::All
    }
}

/// The multi-dimensional predicate applied by the filter engine.
///
/// Dimensions are matched independently and combined by logical AND.
/// The default criteria match every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Permitted `user_key` values.
    pub users: Selection,
    /// Permitted `locale` values.
    pub locales: Selection,
    /// Permitted `project_id` values.
    pub projects: Selection,
    /// Permitted `date` range.
    pub dates: DateRange,
}

impl FilterCriteria {
    /// Whether `record` passes every dimension of the criteria.
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        self.users.matches(Some(record.user_key.as_str()))
            && self.locales.matches(record.locale.as_deref())
            && self.projects.matches(record.project_id.as_deref())
            && self.dates.matches(record.date)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
