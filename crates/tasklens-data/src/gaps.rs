//! Per-user idle-gap detection.
//!
//! The idle gap of a record is the time elapsed since the start of the same
//! user's immediately preceding task.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tasklens_core::models::NormalizedRecord;

// ── Report types ──────────────────────────────────────────────────────────────

/// One record in a user's time-ordered sequence, with the gap since the
/// preceding record.
#[derive(Debug, Clone, Serialize)]
pub struct GapEntry {
    pub record: NormalizedRecord,
    /// Minutes since the user's previous task start. `None` for the first
    /// record (no prior task). Zero is valid: simultaneous starts.
    pub gap_minutes: Option<f64>,
}

/// A single user's gap sequence plus their unscheduled records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserGaps {
    /// Records with a start timestamp, sorted ascending (stable: ties keep
    /// their original order), each with its gap.
    pub entries: Vec<GapEntry>,
    /// Records with no start timestamp. Excluded from the gap computation
    /// but reported rather than silently dropped.
    pub unscheduled: Vec<NormalizedRecord>,
}

/// Idle gaps for every user in a view, keyed by `user_key`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdleGapReport {
    pub users: BTreeMap<String, UserGaps>,
}

// ── IdleGapDetector ───────────────────────────────────────────────────────────

/// Computes per-user inter-task time gaps.
pub struct IdleGapDetector;

impl IdleGapDetector {
    /// Detect idle gaps in `view`.
    ///
    /// Records are grouped by `user_key`; within each group, scheduled
    /// records are stable-sorted by start timestamp and each gap is the
    /// minutes since the previous start.
    pub fn detect(view: &[NormalizedRecord]) -> IdleGapReport {
        let mut report = IdleGapReport::default();

        for record in view {
            let user = report.users.entry(record.user_key.clone()).or_default();
            match record.start_timestamp {
                Some(_) => user.entries.push(GapEntry {
                    record: record.clone(),
                    gap_minutes: None,
                }),
                None => user.unscheduled.push(record.clone()),
            }
        }

        for user in report.users.values_mut() {
            // Stable sort: records with equal timestamps keep view order.
            // All entries are scheduled by construction.
            user.entries.sort_by_key(|e| e.record.start_timestamp);

            let mut previous: Option<NaiveDateTime> = None;
            for entry in &mut user.entries {
                let Some(start) = entry.record.start_timestamp else {
                    continue;
                };
                entry.gap_minutes =
                    previous.map(|prev| (start - prev).num_seconds() as f64 / 60.0);
                previous = Some(start);
            }
        }

        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
