//! Text-marker provenance
//!
//! Automation leaves marker strings in summaries and descriptions; their
//! presence is how later events recognize issues the pipeline already touched.

use crate::error::ValidationError;
use crate::models::{Issue, MarkerConfig};

/// Summary carries the criteria marker
pub fn is_criteria_summary(issue: &Issue, markers: &MarkerConfig) -> bool {
    issue.summary().contains(markers.criteria.as_str())
}

/// Description carries the generated-by marker
pub fn has_generated_marker(issue: &Issue, markers: &MarkerConfig) -> bool {
    issue.description().contains(markers.generated.as_str())
}

/// Any provenance marker in summary or description
pub fn has_provenance(issue: &Issue, markers: &MarkerConfig) -> bool {
    markers
        .provenance_markers()
        .iter()
        .filter(|m| !m.is_empty())
        .any(|m| issue.summary().contains(m) || issue.description().contains(m))
}

/// A criteria issue must carry both the summary and the description marker
///
/// Guards against a human-written summary that happens to contain the marker.
pub fn validate_criteria_issue(issue: &Issue, markers: &MarkerConfig) -> Result<(), ValidationError> {
    if !is_criteria_summary(issue, markers) {
        return Err(ValidationError::MissingCriteriaMarker {
            key: issue.key.clone(),
        });
    }
    if !has_generated_marker(issue, markers) {
        return Err(ValidationError::MissingGeneratedMarker {
            key: issue.key.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueType;

    fn issue(summary: &str, description: &str) -> Issue {
        Issue::new("ABC-2", IssueType::Task, "To Do", summary, description)
    }

    #[test]
    fn test_provenance_in_summary_or_description() {
        let markers = MarkerConfig::default();
        assert!(!has_provenance(&issue("Export CSV", "plain"), &markers));
        assert!(has_provenance(&issue("Export CSV", "x\n[Claude AI Touched] y"), &markers));
        assert!(has_provenance(&issue("Deliverable Criteria: ABC-1", ""), &markers));
    }

    #[test]
    fn test_validate_requires_both_markers() {
        let markers = MarkerConfig::default();
        let err = validate_criteria_issue(&issue("Deliverable Criteria: ABC-1", "hand written"), &markers)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingGeneratedMarker { .. }));

        let err = validate_criteria_issue(&issue("Export CSV", "Generated by Claude AI"), &markers)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingCriteriaMarker { .. }));

        assert!(validate_criteria_issue(
            &issue("Deliverable Criteria: ABC-1 - Export", "...\nGenerated by Claude AI"),
            &markers
        )
        .is_ok());
    }
}
