//! Per-user efficiency scoring: minutes per logged task.

use std::collections::BTreeMap;

use serde::Serialize;
use tasklens_core::models::NormalizedRecord;

/// One user's efficiency figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyScore {
    /// Sum of non-null durations, in minutes.
    pub total_minutes: f64,
    /// Number of records, null durations included — a task was still logged.
    pub task_count: u32,
    /// `total_minutes / task_count`; `None` when no tasks were logged.
    pub score: Option<f64>,
}

/// Computes per-user minutes-per-task ratios.
pub struct EfficiencyScorer;

impl EfficiencyScorer {
    /// Score every user in `view`, keyed by `user_key`.
    pub fn score(view: &[NormalizedRecord]) -> BTreeMap<String, EfficiencyScore> {
        let mut scores: BTreeMap<String, EfficiencyScore> = BTreeMap::new();

        for record in view {
            let entry = scores.entry(record.user_key.clone()).or_default();
            entry.task_count += 1;
            if let Some(minutes) = record.duration_minutes {
                entry.total_minutes += minutes;
            }
        }

        for score in scores.values_mut() {
            score.score =
                (score.task_count > 0).then(|| score.total_minutes / score.task_count as f64);
        }

        scores
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, minutes: Option<f64>) -> NormalizedRecord {
        NormalizedRecord {
            user_key: user.to_string(),
            user_display_name: user.to_string(),
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

    #[test]
    fn test_score_three_tasks() {
        // 10 + 20 + 30 minutes over 3 tasks → score 20.
        let view = vec![
            record("alice", Some(10.0)),
            record("alice", Some(20.0)),
            record("alice", Some(30.0)),
        ];
        let scores = EfficiencyScorer::score(&view);
        let alice = &scores["alice"];
        assert_eq!(alice.total_minutes, 60.0);
        assert_eq!(alice.task_count, 3);
        assert_eq!(alice.score, Some(20.0));
    }

    #[test]
    fn test_null_duration_counts_as_task_but_adds_no_minutes() {
        let view = vec![record("alice", Some(30.0)), record("alice", None)];
        let scores = EfficiencyScorer::score(&view);
        let alice = &scores["alice"];
        assert_eq!(alice.total_minutes, 30.0);
        assert_eq!(alice.task_count, 2);
        assert_eq!(alice.score, Some(15.0));
    }

    #[test]
    fn test_users_scored_independently() {
        let view = vec![
            record("alice", Some(40.0)),
            record("bob", Some(10.0)),
            record("bob", Some(10.0)),
        ];
        let scores = EfficiencyScorer::score(&view);
        assert_eq!(scores["alice"].score, Some(40.0));
        assert_eq!(scores["bob"].score, Some(10.0));
    }

    #[test]
    fn test_empty_view_has_no_users() {
        // Zero tasks never reach a division: absent users simply have no
        // entry rather than a zero-count score.
        let scores = EfficiencyScorer::score(&[]);
        assert!(scores.is_empty());
    }
}
