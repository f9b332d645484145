//! Column-mapping configuration for heterogeneous uploaded sources.
//!
//! The near-identical sources observed in practice differ only in their
//! column-naming conventions (`user` vs `user_first_name`, `minutes` vs
//! `start_time`+`end_time`, ...). Rather than one code path per convention,
//! a single [`ColumnMap`] enumerates the accepted synonyms per canonical
//! field and is resolved once against each source's header set.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasklensError};

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Accepted column-name synonyms for every canonical field, in priority
/// order (the first synonym present in a source's headers wins).
///
/// Matching is case-insensitive on trimmed header names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Single-column user identifier (first name or full name).
    pub user: Vec<String>,
    /// Pre-formatted display name, when the source carries one separately
    /// from the identifier (the canonical export does).
    pub user_display_name: Vec<String>,
    /// First-name part when the source splits names into two columns.
    pub user_first_name: Vec<String>,
    /// Last-name part when the source splits names into two columns.
    pub user_last_name: Vec<String>,
    /// User locale.
    pub locale: Vec<String>,
    /// Project identifier.
    pub project_id: Vec<String>,
    /// Task label. Required.
    pub task_label: Vec<String>,
    /// Direct duration-in-minutes column.
    pub duration_minutes: Vec<String>,
    /// Start-of-task clock column (duration = end − start).
    pub start_time: Vec<String>,
    /// End-of-task clock column.
    pub end_time: Vec<String>,
    /// Dedicated start-timestamp column, when the source has one separate
    /// from the duration pair.
    pub start_timestamp: Vec<String>,
}

impl Default for ColumnMap {
    /// Synonyms covering the column-name variants observed across the
    /// uploaded sources in practice.
    fn default() -> Self {
        fn cols(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            user: cols(&["user", "user_name", "username", "user_key"]),
            user_display_name: cols(&["user_display_name", "display_name"]),
            user_first_name: cols(&["user_first_name", "first_name"]),
            user_last_name: cols(&["user_last_name", "last_name"]),
            locale: cols(&["locale", "user_locale"]),
            project_id: cols(&["project_id", "project"]),
            task_label: cols(&["task", "task_label", "task_name"]),
            duration_minutes: cols(&["minutes", "duration_minutes", "duration"]),
            start_time: cols(&["start_time"]),
            end_time: cols(&["end_time"]),
            start_timestamp: cols(&["started_at", "start_timestamp", "timestamp", "date"]),
        }
    }
}

impl ColumnMap {
    /// Resolve this mapping against a source's header set.
    ///
    /// Returns the actual column name to read for each canonical field, or
    /// a [`TasklensError::SchemaMismatch`] naming every missing *required*
    /// field: the task label, and at least one duration source (a minutes
    /// column, or the complete `start_time` + `end_time` pair).
    pub fn resolve(&self, headers: &[String], source: &str) -> Result<ResolvedColumns> {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let find = |synonyms: &[String]| -> Option<String> {
            synonyms.iter().find_map(|syn| {
                lower
                    .iter()
                    .position(|h| h == &syn.to_lowercase())
                    .map(|i| headers[i].clone())
            })
        };

        let resolved = ResolvedColumns {
            user: find(&self.user),
            display_name: find(&self.user_display_name),
            first_name: find(&self.user_first_name),
            last_name: find(&self.user_last_name),
            locale: find(&self.locale),
            project_id: find(&self.project_id),
            task_label: find(&self.task_label),
            minutes: find(&self.duration_minutes),
            start_time: find(&self.start_time),
            end_time: find(&self.end_time),
            timestamp: find(&self.start_timestamp),
        };

        let mut missing: Vec<String> = Vec::new();
        if resolved.task_label.is_none() {
            missing.push("task_label".to_string());
        }
        if !resolved.has_duration_source() {
            missing.push("duration_minutes".to_string());
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(TasklensError::SchemaMismatch {
                source_name: source.to_string(),
                missing,
            })
        }
    }
}

// ── ResolvedColumns ───────────────────────────────────────────────────────────

/// The per-source outcome of resolving a [`ColumnMap`]: the actual column
/// name to read for each canonical field, where one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub user: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub locale: Option<String>,
    pub project_id: Option<String>,
    pub task_label: Option<String>,
    pub minutes: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timestamp: Option<String>,
}

impl ResolvedColumns {
    /// Whether the source provides any way to obtain a duration: a direct
    /// minutes column, or the complete start/end clock pair.
    pub fn has_duration_source(&self) -> bool {
        self.minutes.is_some() || (self.start_time.is_some() && self.end_time.is_some())
    }

    /// Column to read the start timestamp from: the dedicated timestamp
    /// column when present, otherwise the `start_time` half of the duration
    /// pair.
    pub fn timestamp_column(&self) -> Option<&str> {
        self.timestamp
            .as_deref()
            .or(self.start_time.as_deref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
