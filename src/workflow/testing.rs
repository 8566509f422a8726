//! Testing-criteria phase: evaluate the stored implementation

use super::processor::WebhookProcessor;
use super::render;
use super::verdict::compute_verdict;
use crate::error::{ErrorKind, PhaseError};
use crate::models::{
    Action, BestEffort, Classification, EvaluationRecord, Issue, IssueType, OverrideKind,
    ProcessOutcome, Stage, Verdict,
};
use crate::store::{evaluation_files, load_implementation, Phase};
use crate::tracker::IssueUpdate;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

const CLASSIFICATION: Classification = Classification::TestingCriteria;

/// How a passed criteria issue was marked complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Completion {
    Transitioned { transition: String },
    SummaryPrefixed,
    CommentOnly,
    Unreported,
}

impl WebhookProcessor {
    pub(super) async fn handle_testing_criteria(
        &self,
        issue: &Issue,
    ) -> Result<ProcessOutcome, PhaseError> {
        let original_key = match self.criteria_preamble(CLASSIFICATION, issue).await {
            Ok(key) => key,
            Err(outcome) => return Ok(outcome),
        };

        let stage = self.stages.current(issue);
        let forced = self.stages.is_forced(issue, OverrideKind::Retest);
        if stage == Stage::Tested && !forced {
            info!("Evaluation already ran, skipping");
            let outcome = ProcessOutcome::new(Action::Skipped, CLASSIFICATION)
                .with_issue(&issue.key)
                .with_original(&original_key)
                .with_stage(stage);
            let comment = render::skipped_comment(
                stage,
                &self.stages.override_label(OverrideKind::Retest),
                "evaluation",
            );
            return Ok(self.report(&issue.key, outcome, &comment).await);
        }

        let mut outcome = ProcessOutcome::new(Action::EvaluationFailed, CLASSIFICATION)
            .with_issue(&issue.key)
            .with_original(&original_key);
        if forced {
            info!("Re-running evaluation on request");
            outcome.note(
                self.stages
                    .clear_override(&issue.key, OverrideKind::Retest)
                    .await,
            );
        }

        let artifact = match load_implementation(self.store.as_ref(), &original_key).await {
            Ok((artifact, _)) => artifact,
            Err(e) => {
                warn!(error = %e, "No stored implementation to evaluate");
                outcome.action = Action::ImplementationNotFound;
                outcome.error_kind = Some(ErrorKind::PersistenceFailure);
                outcome.message = Some(e.to_string());
                let ready = self
                    .workflow
                    .ready_statuses
                    .first()
                    .map(String::as_str)
                    .unwrap_or("Ready for Implementation");
                let comment =
                    render::implementation_not_found_comment(&original_key, &e.to_string(), ready);
                return Ok(self.report(&issue.key, outcome, &comment).await);
            }
        };

        let evaluation = match self
            .adapter
            .evaluate_implementation(issue, &original_key, &artifact)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(error = %e, "Evaluation call failed");
                outcome.error_kind = Some(ErrorKind::AdapterFailure);
                outcome.message = Some(e.to_string());
                outcome.details = json!({ "reason": "claude_evaluation_failure" });
                let comment = render::evaluation_error_comment(&e.to_string());
                return Ok(self.report(&issue.key, outcome, &comment).await);
            }
        };

        let verdict = compute_verdict(&evaluation);
        info!(
            passed = verdict.passed,
            overall = verdict.overall,
            blocking = evaluation.blocking_issue_count(),
            "Computed verdict"
        );

        let record = EvaluationRecord {
            original_key: original_key.clone(),
            criteria_key: issue.key.clone(),
            evaluation,
            verdict,
            evaluated_at: Utc::now(),
        };
        outcome.note(self.persist_evaluation(&record).await);
        outcome.note(self.stages.advance(&issue.key, Stage::Tested).await);
        outcome.stage = Some(Stage::Tested);

        let EvaluationRecord {
            evaluation, verdict, ..
        } = record;
        let scores = evaluation.scores.clamped();

        if verdict.passed {
            let comment = render::evaluation_passed_comment(
                &original_key,
                &evaluation,
                &verdict,
                &artifact.result.usage_instructions,
            );
            outcome.note(self.comment(&issue.key, &comment).await);
            let (completion, steps) = self.complete(issue, &verdict).await;
            steps.into_iter().for_each(|s| outcome.note(s));

            outcome.action = Action::EvaluationPassed;
            outcome.details = json!({
                "overall": verdict.overall,
                "scores": scores,
                "completion": completion,
            });
        } else {
            let comment = render::evaluation_failed_comment(
                &original_key,
                &evaluation,
                &verdict,
                &self.stages.override_label(OverrideKind::Reimplement),
            );
            outcome.note(self.comment(&issue.key, &comment).await);

            outcome.critical_issues = evaluation.critical_issues().into_iter().cloned().collect();
            outcome.details = json!({
                "overall": verdict.overall,
                "scores": scores,
                "failures": verdict.failures,
            });
        }
        Ok(outcome)
    }

    /// Store the evaluation bundle; failure is a warning only
    async fn persist_evaluation(&self, record: &EvaluationRecord) -> BestEffort {
        let stored = match evaluation_files(record) {
            Ok(files) => {
                self.store
                    .write_files(&record.original_key, Phase::Evaluation, &files)
                    .await
            }
            Err(e) => Err(e),
        };
        match stored {
            Ok(()) => BestEffort::Applied,
            Err(e) => {
                warn!(error = %e, "Failed to store evaluation results");
                BestEffort::warned("store_evaluation", e)
            }
        }
    }

    fn done_status(&self, issue: &Issue) -> &str {
        match issue.issue_type() {
            Some(IssueType::Story) => &self.workflow.story_done_status,
            _ => &self.workflow.task_done_status,
        }
    }

    /// Mark a passed criteria issue complete
    ///
    /// Tries the completion transition, then a summary prefix with a
    /// description note, then a comment.
    async fn complete(&self, issue: &Issue, verdict: &Verdict) -> (Completion, Vec<BestEffort>) {
        let done = self.done_status(issue);
        let mut steps = Vec::new();

        match self.tracker.get_transitions(&issue.key).await {
            Ok(transitions) => {
                let found = transitions
                    .iter()
                    .find(|t| t.name.trim().eq_ignore_ascii_case(done))
                    .or_else(|| {
                        transitions.iter().find(|t| {
                            t.to_status
                                .as_deref()
                                .is_some_and(|s| s.trim().eq_ignore_ascii_case(done))
                        })
                    });
                match found {
                    Some(transition) => {
                        match self.tracker.transition_issue(&issue.key, &transition.id).await {
                            Ok(()) => {
                                info!(transition = %transition.name, "Moved criteria issue to completion status");
                                return (
                                    Completion::Transitioned {
                                        transition: transition.name.clone(),
                                    },
                                    steps,
                                );
                            }
                            Err(e) => {
                                warn!(error = %e, "Completion transition failed");
                                steps.push(BestEffort::warned("transition_issue", e));
                            }
                        }
                    }
                    None => info!(status = done, "No completion transition available"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list transitions");
                steps.push(BestEffort::warned("get_transitions", e));
            }
        }

        let prefix = &self.workflow.markers.completed_prefix;
        let summary = if issue.summary().starts_with(prefix.as_str()) {
            issue.summary().to_string()
        } else {
            format!("{} {}", prefix, issue.summary())
        };
        let update = IssueUpdate {
            summary: Some(summary),
            description: Some(format!(
                "{}{}",
                issue.description().trim_end(),
                render::completion_note(verdict)
            )),
            labels: None,
        };
        match self.tracker.update_issue(&issue.key, update).await {
            Ok(()) => {
                info!("Marked criteria issue complete via summary prefix");
                return (Completion::SummaryPrefixed, steps);
            }
            Err(e) => {
                warn!(error = %e, "Summary prefix fallback failed");
                steps.push(BestEffort::warned("mark_summary_completed", e));
            }
        }

        match self
            .tracker
            .add_comment(&issue.key, &render::completion_comment(done))
            .await
        {
            Ok(()) => (Completion::CommentOnly, steps),
            Err(e) => {
                warn!(error = %e, "Completion comment failed");
                steps.push(BestEffort::warned("completion_comment", e));
                (Completion::Unreported, steps)
            }
        }
    }
}
