//! Deliverable-criteria phase: generate and store the implementation

use super::processor::WebhookProcessor;
use super::render;
use crate::error::{ErrorKind, PhaseError};
use crate::models::{Action, Classification, Issue, OverrideKind, ProcessOutcome, Stage};
use crate::parser::extract_requirements;
use crate::store::{implementation_files, Phase};
use serde_json::json;
use tracing::{info, warn};

const CLASSIFICATION: Classification = Classification::DeliverableCriteria;

impl WebhookProcessor {
    pub(super) async fn handle_deliverable_criteria(
        &self,
        issue: &Issue,
    ) -> Result<ProcessOutcome, PhaseError> {
        let original_key = match self.criteria_preamble(CLASSIFICATION, issue).await {
            Ok(key) => key,
            Err(outcome) => return Ok(outcome),
        };

        let stage = self.stages.current(issue);
        let forced = self.stages.is_forced(issue, OverrideKind::Reimplement);
        if stage >= Stage::Implemented && !forced {
            info!(stage = %stage, "Implementation already generated, skipping");
            let outcome = ProcessOutcome::new(Action::Skipped, CLASSIFICATION)
                .with_issue(&issue.key)
                .with_original(&original_key)
                .with_stage(stage);
            let comment = render::skipped_comment(
                stage,
                &self.stages.override_label(OverrideKind::Reimplement),
                "implementation",
            );
            return Ok(self.report(&issue.key, outcome, &comment).await);
        }

        let mut warnings = Vec::new();
        if forced {
            info!("Re-running implementation on request");
            warnings.push(
                self.stages
                    .clear_override(&issue.key, OverrideKind::Reimplement)
                    .await,
            );
        }

        let original = self.tracker.get_issue(&original_key).await?;
        let requirements = extract_requirements(issue.description());
        info!(
            original_summary = original.summary(),
            requirements = requirements.total(),
            "Generating implementation"
        );

        let result = match self
            .adapter
            .generate_implementation(issue, &original_key, &requirements)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Implementation generation failed");
                let mut outcome = ProcessOutcome::failure(
                    Action::ImplementationFailed,
                    CLASSIFICATION,
                    ErrorKind::AdapterFailure,
                    e.to_string(),
                )
                .with_issue(&issue.key)
                .with_original(&original_key);
                warnings.into_iter().for_each(|w| outcome.note(w));
                let comment = render::implementation_failed_comment(&e.to_string());
                return Ok(self.report(&issue.key, outcome, &comment).await);
            }
        };

        let stored = match implementation_files(&issue.key, &original_key, &result) {
            Ok(files) => {
                let names: Vec<String> = files.keys().cloned().collect();
                self.store
                    .write_files(&original_key, Phase::Implementation, &files)
                    .await
                    .map(|()| names)
            }
            Err(e) => Err(e),
        };
        let files = match stored {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Failed to store implementation artifacts");
                let mut outcome = ProcessOutcome::failure(
                    Action::ArtifactsFailed,
                    CLASSIFICATION,
                    ErrorKind::PersistenceFailure,
                    e.to_string(),
                )
                .with_issue(&issue.key)
                .with_original(&original_key);
                outcome.implementation = Some(result);
                warnings.into_iter().for_each(|w| outcome.note(w));
                let comment = render::artifacts_failed_comment(&original_key, &e.to_string());
                return Ok(self.report(&issue.key, outcome, &comment).await);
            }
        };

        let mut outcome = ProcessOutcome::new(Action::ImplementationGenerated, CLASSIFICATION)
            .with_issue(&issue.key)
            .with_original(&original_key)
            .with_stage(Stage::Implemented)
            .with_details(json!({
                "deliverable_type": result.deliverable_type,
                "files": files,
            }));
        warnings.into_iter().for_each(|w| outcome.note(w));

        let comment = render::implementation_success_comment(
            &original_key,
            &result,
            &files,
            &self.workflow.testing_status,
        );
        outcome.note(self.comment(&issue.key, &comment).await);
        outcome.note(self.stages.advance(&issue.key, Stage::Implemented).await);

        info!(files = files.len(), "Implementation stored");
        Ok(outcome)
    }
}
