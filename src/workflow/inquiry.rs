//! Initial-inquiry phase: analyze a new issue and create its criteria issue

use super::processor::WebhookProcessor;
use super::render;
use crate::error::{PhaseError, ValidationError};
use crate::models::{Action, AnalysisResult, Classification, Issue, IssueType, ProcessOutcome, Stage};
use crate::tracker::{IssueUpdate, LinkType, NewIssue};
use serde_json::json;
use tracing::info;

impl WebhookProcessor {
    /// Analyze, mark the original, create and link the criteria issue
    ///
    /// Unlike the criteria phases, a failure here is returned to the caller,
    /// which reports it on the original issue.
    pub(super) async fn handle_initial_inquiry(
        &self,
        issue: &Issue,
    ) -> Result<ProcessOutcome, PhaseError> {
        let markers = &self.workflow.markers;

        let analysis: AnalysisResult = self.adapter.analyze_requirements(issue).await?;
        info!(
            requirements = analysis.requirement_count(),
            fallback = analysis.fallback,
            "Requirements analyzed"
        );

        let description = render::description_with_marker(issue, &analysis, markers);
        self.tracker
            .update_issue(&issue.key, IssueUpdate::description(description))
            .await?;

        let project_key = issue
            .project_key()
            .ok_or_else(|| ValidationError::MissingProject {
                key: issue.key.clone(),
            })?
            .to_string();
        let criteria = self
            .tracker
            .create_issue(NewIssue {
                project_key,
                issue_type: IssueType::Task,
                summary: render::criteria_summary(issue, markers),
                description: render::criteria_description(issue, &analysis, &self.workflow),
            })
            .await?;
        info!(criteria_key = %criteria.key, "Created criteria issue");

        self.tracker
            .link_issues(&issue.key, &criteria.key, LinkType::Relates)
            .await?;

        let mut outcome = ProcessOutcome::new(Action::CriteriaCreated, Classification::InitialInquiry)
            .with_issue(&issue.key)
            .with_details(json!({
                "criteria_key": criteria.key,
                "analysis": analysis,
            }));
        // Stage labels live on criteria issues only
        outcome.note(self.stages.advance(&criteria.key, Stage::Analyzed).await);
        Ok(outcome)
    }
}
