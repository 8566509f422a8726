//! Webhook processor
//!
//! Single entry point for one webhook delivery: classify, dispatch to a phase
//! handler, and turn every failure into a reported [`ProcessOutcome`].

use super::classify::classify;
use super::render;
use super::stage::StageTracker;
use crate::adapters::AiAdapter;
use crate::error::{ErrorKind, ExtractionError, PhaseError};
use crate::models::{
    Action, BestEffort, Classification, Issue, ProcessOutcome, WebhookEvent, WorkflowConfig,
};
use crate::parser::KeyExtractor;
use crate::store::ArtifactStore;
use crate::tracker::IssueTracker;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub struct WebhookProcessor {
    pub(super) workflow: WorkflowConfig,
    pub(super) tracker: Arc<dyn IssueTracker>,
    pub(super) adapter: Arc<dyn AiAdapter>,
    pub(super) store: Arc<dyn ArtifactStore>,
    pub(super) extractor: KeyExtractor,
    pub(super) stages: StageTracker,
}

impl WebhookProcessor {
    /// Fails only if the configured criteria marker or project keys yield an invalid pattern
    pub fn new(
        workflow: WorkflowConfig,
        tracker: Arc<dyn IssueTracker>,
        adapter: Arc<dyn AiAdapter>,
        store: Arc<dyn ArtifactStore>,
    ) -> Result<Self, regex::Error> {
        let extractor = KeyExtractor::new(&workflow.markers.criteria, &workflow.project_keys)?;
        let stages = StageTracker::new(
            tracker.clone(),
            workflow.stage_label_prefix.clone(),
            workflow.override_label_prefix.clone(),
        );
        Ok(Self {
            workflow,
            tracker,
            adapter,
            store,
            extractor,
            stages,
        })
    }

    pub fn workflow(&self) -> &WorkflowConfig {
        &self.workflow
    }

    pub fn classify(&self, event: &WebhookEvent) -> Classification {
        classify(event, &self.workflow)
    }

    /// Process one delivery; never fails, every failure is an outcome
    pub async fn process_webhook(&self, event: &WebhookEvent) -> ProcessOutcome {
        let span = info_span!(
            "webhook",
            delivery_id = %Uuid::new_v4(),
            issue_key = event.issue_key().unwrap_or("-"),
        );
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: &WebhookEvent) -> ProcessOutcome {
        let classification = self.classify(event);
        if let Classification::Ignore(reason) = classification {
            info!(event = %event.webhook_event, reason = reason.describe(), "Ignoring event");
            return ProcessOutcome::ignored(classification, event.issue_key())
                .with_message(reason.describe());
        }
        let Some(issue) = event.issue.as_ref() else {
            return ProcessOutcome::ignored(classification, None)
                .with_message("event carries no issue");
        };

        info!(
            classification = classification.as_str(),
            status = issue.status(),
            "Processing event"
        );

        let outcome = match classification {
            Classification::InitialInquiry => match self.handle_initial_inquiry(issue).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Initial inquiry failed");
                    let outcome = ProcessOutcome::failure(
                        Action::SystemError,
                        classification,
                        e.kind(),
                        e.to_string(),
                    )
                    .with_issue(&issue.key);
                    let comment = render::inquiry_failed_comment(&e.to_string());
                    self.report(&issue.key, outcome, &comment).await
                }
            },
            Classification::DeliverableCriteria => {
                let result = self.handle_deliverable_criteria(issue).await;
                self.settle(classification, issue, result).await
            }
            Classification::TestingCriteria => {
                let result = self.handle_testing_criteria(issue).await;
                self.settle(classification, issue, result).await
            }
            Classification::Ignore(_) => ProcessOutcome::ignored(classification, Some(&issue.key)),
        };

        info!(
            action = outcome.action.as_str(),
            error_kind = outcome.error_kind.map(|k| k.as_str()),
            warnings = outcome.warnings.len(),
            "Finished processing"
        );
        outcome
    }

    /// Report an error that escaped a criteria phase as `system_error`
    async fn settle(
        &self,
        classification: Classification,
        issue: &Issue,
        result: Result<ProcessOutcome, PhaseError>,
    ) -> ProcessOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Phase failed unexpectedly");
                let mut outcome = ProcessOutcome::failure(
                    Action::SystemError,
                    classification,
                    e.kind(),
                    e.to_string(),
                )
                .with_issue(&issue.key);
                outcome.note(
                    self.comment(&issue.key, &render::system_error_comment(&e.to_string()))
                        .await,
                );
                outcome
            }
        }
    }

    /// Post a comment; a failure is only a warning
    pub(super) async fn comment(&self, key: &str, body: &str) -> BestEffort {
        match self.tracker.add_comment(key, body).await {
            Ok(()) => BestEffort::Applied,
            Err(e) => {
                warn!(issue_key = key, error = %e, "Failed to post comment");
                BestEffort::warned("add_comment", e)
            }
        }
    }

    /// Failure outcome mirrored as a comment on `key`
    pub(super) async fn report(
        &self,
        key: &str,
        mut outcome: ProcessOutcome,
        comment: &str,
    ) -> ProcessOutcome {
        outcome.note(self.comment(key, comment).await);
        outcome
    }

    /// Shared first steps of both criteria phases: provenance check, key extraction
    pub(super) async fn criteria_preamble(
        &self,
        classification: Classification,
        issue: &Issue,
    ) -> Result<String, ProcessOutcome> {
        if let Err(e) = super::markers::validate_criteria_issue(issue, &self.workflow.markers) {
            warn!(error = %e, "Criteria issue failed provenance validation");
            let outcome = ProcessOutcome::failure(
                Action::ValidationError,
                classification,
                ErrorKind::ValidationError,
                e.to_string(),
            )
            .with_issue(&issue.key);
            return Err(self
                .report(&issue.key, outcome, &render::validation_failed_comment(&e.to_string()))
                .await);
        }

        match self.extractor.extract_with_source(issue) {
            Some((original_key, source)) => {
                info!(original_key = %original_key, ?source, "Resolved original issue");
                Ok(original_key)
            }
            None => {
                warn!("Could not extract original issue key");
                let error = ExtractionError {
                    criteria_key: issue.key.clone(),
                };
                let outcome = ProcessOutcome::failure(
                    Action::ExtractionError,
                    classification,
                    ErrorKind::ExtractionError,
                    error.to_string(),
                )
                .with_issue(&issue.key);
                Err(self
                    .report(
                        &issue.key,
                        outcome,
                        &render::extraction_failed_comment(&self.workflow.markers),
                    )
                    .await)
            }
        }
    }
}
