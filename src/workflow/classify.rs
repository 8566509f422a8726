//! Classification engine
//!
//! Pure mapping from a webhook event to a processing intent. No tracker or
//! model calls happen here.

use super::markers::{has_provenance, is_criteria_summary};
use crate::models::{
    Classification, EventKind, IgnoreReason, IssueType, WebhookEvent, WorkflowConfig,
};

/// Classify one event
///
/// Updates only matter for criteria issues whose status changed to an
/// actionable status. Created issues without provenance markers are new
/// inquiries. For criteria issues the testing status is checked before the
/// ready statuses.
pub fn classify(event: &WebhookEvent, workflow: &WorkflowConfig) -> Classification {
    let kind = event.kind();
    if kind == EventKind::Other {
        return Classification::Ignore(IgnoreReason::UnsupportedEvent);
    }
    let Some(issue) = event.issue.as_ref().filter(|i| !i.key.trim().is_empty()) else {
        return Classification::Ignore(IgnoreReason::MissingIssue);
    };
    if !matches!(issue.issue_type(), Some(IssueType::Story | IssueType::Task)) {
        return Classification::Ignore(IgnoreReason::UnsupportedIssueType);
    }

    let markers = &workflow.markers;
    let criteria = is_criteria_summary(issue, markers);

    if kind == EventKind::Updated {
        let Some(change) = event.changelog.as_ref().and_then(|c| c.status_change()) else {
            return Classification::Ignore(IgnoreReason::NoStatusChange);
        };
        if !criteria {
            return Classification::Ignore(IgnoreReason::NotCriteriaIssue);
        }
        let new_status = change.to_value.as_deref().unwrap_or("");
        if !workflow.is_actionable_status(new_status) {
            return Classification::Ignore(IgnoreReason::StatusNotActionable);
        }
    }

    if !has_provenance(issue, markers) {
        return Classification::InitialInquiry;
    }

    if criteria {
        let status = issue.status();
        if workflow.is_testing_status(status) {
            return Classification::TestingCriteria;
        }
        if workflow.is_ready_status(status) {
            return Classification::DeliverableCriteria;
        }
        return Classification::Ignore(IgnoreReason::StatusNotActionable);
    }

    Classification::Ignore(IgnoreReason::AlreadyProcessed)
}
