//! Stage tracker
//!
//! The stage of a criteria issue lives in the tracker as a single label. Every
//! write here is best-effort: a failure is logged and reported as
//! [`BestEffort::Warned`], never as an error.

use crate::models::{BestEffort, Issue, OverrideKind, Stage};
use crate::tracker::IssueTracker;
use std::sync::Arc;
use tracing::{debug, warn};

/// Furthest stage among the labels
///
/// Several stage labels should never coexist; if they do, the furthest wins
/// and the extras are left alone until the next advance.
pub fn current_stage(labels: &[String], prefix: &str) -> Stage {
    labels
        .iter()
        .filter_map(|l| Stage::from_label(l, prefix))
        .max()
        .unwrap_or(Stage::None)
}

pub fn has_override(issue: &Issue, kind: OverrideKind, prefix: &str) -> bool {
    issue.has_label(&kind.label(prefix))
}

/// Label set with every stage label replaced by the one for `stage`
pub fn labels_with_stage(labels: &[String], stage: Stage, prefix: &str) -> Vec<String> {
    let mut next: Vec<String> = labels
        .iter()
        .filter(|l| Stage::from_label(l, prefix).is_none())
        .cloned()
        .collect();
    if let Some(label) = stage.label(prefix) {
        next.push(label);
    }
    next
}

/// Reads and writes stage and override labels through the tracker
pub struct StageTracker {
    tracker: Arc<dyn IssueTracker>,
    prefix: String,
    override_prefix: String,
}

impl StageTracker {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        prefix: impl Into<String>,
        override_prefix: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            prefix: prefix.into(),
            override_prefix: override_prefix.into(),
        }
    }

    pub fn current(&self, issue: &Issue) -> Stage {
        current_stage(issue.labels(), &self.prefix)
    }

    pub fn override_label(&self, kind: OverrideKind) -> String {
        kind.label(&self.override_prefix)
    }

    /// Whether a human asked for one more run of `kind`
    pub fn is_forced(&self, issue: &Issue, kind: OverrideKind) -> bool {
        has_override(issue, kind, &self.override_prefix)
    }

    /// Replace the stage label with the one for `stage`
    ///
    /// Labels are re-read first so that concurrent edits by humans survive.
    pub async fn advance(&self, key: &str, stage: Stage) -> BestEffort {
        let issue = match self.tracker.get_issue(key).await {
            Ok(issue) => issue,
            Err(e) => {
                warn!(issue_key = key, stage = %stage, error = %e, "Failed to read labels for stage advance");
                return BestEffort::warned("advance_stage", e);
            }
        };

        let labels = labels_with_stage(issue.labels(), stage, &self.prefix);
        match self.tracker.update_labels(key, labels).await {
            Ok(()) => {
                debug!(issue_key = key, stage = %stage, "Advanced stage");
                BestEffort::Applied
            }
            Err(e) => {
                warn!(issue_key = key, stage = %stage, error = %e, "Failed to write stage label");
                BestEffort::warned("advance_stage", e)
            }
        }
    }

    /// Remove a consumed override label
    pub async fn clear_override(&self, key: &str, kind: OverrideKind) -> BestEffort {
        let label = self.override_label(kind);
        let issue = match self.tracker.get_issue(key).await {
            Ok(issue) => issue,
            Err(e) => {
                warn!(issue_key = key, label = %label, error = %e, "Failed to read labels for override removal");
                return BestEffort::warned("clear_override", e);
            }
        };
        if !issue.has_label(&label) {
            return BestEffort::Applied;
        }

        let labels: Vec<String> = issue
            .labels()
            .iter()
            .filter(|l| **l != label)
            .cloned()
            .collect();
        match self.tracker.update_labels(key, labels).await {
            Ok(()) => {
                debug!(issue_key = key, label = %label, "Consumed override label");
                BestEffort::Applied
            }
            Err(e) => {
                warn!(issue_key = key, label = %label, error = %e, "Failed to remove override label");
                BestEffort::warned("clear_override", e)
            }
        }
    }
}
