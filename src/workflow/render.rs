//! Text written back to the tracker: marker blocks, criteria issues, comments

use super::verdict::{COVERAGE_THRESHOLD, PASS_THRESHOLD};
use crate::models::{
    AnalysisResult, EvaluationResult, ImplementationResult, Issue, MarkerConfig, Stage, Verdict,
    WorkflowConfig,
};
use crate::parser::criteria::{
    ACCEPTANCE_HEADING, DONE_HEADING, FUNCTIONAL_HEADING, TECHNICAL_HEADING, VALIDATION_HEADING,
};
use chrono::Utc;

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- None identified\n".to_string();
    }
    items.iter().map(|i| format!("- {}\n", i.trim())).collect()
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}\n", i + 1, item.trim()))
        .collect()
}

// =============================================================================
// Initial inquiry
// =============================================================================

/// Provenance block appended to an analyzed original issue
pub fn marker_block(analysis: &AnalysisResult, markers: &MarkerConfig) -> String {
    let mut block = String::new();
    block.push_str("\n\n----\n");
    block.push_str(&format!(
        "{} Requirements analysis completed {}\n",
        markers.touched,
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));
    block.push_str(&format!(
        "- Requirements identified: {} ({} functional, {} technical, {} quality)\n",
        analysis.requirement_count(),
        analysis.functional_requirements.len(),
        analysis.technical_requirements.len(),
        analysis.quality_requirements.len()
    ));
    block.push_str(&format!(
        "- Acceptance criteria: {}\n",
        analysis.acceptance_criteria.len()
    ));
    block.push_str(&format!(
        "- Test scenarios: {}\n",
        analysis.test_scenarios.total()
    ));
    block.push_str(&format!(
        "- Estimated effort: {} story points, {} hours, {} complexity\n",
        analysis.effort.story_points, analysis.effort.hours, analysis.effort.complexity
    ));
    if analysis.fallback {
        block.push_str("- Note: generic requirements template used; review before implementation\n");
    }
    block
}

/// Original description with the marker block appended
pub fn description_with_marker(
    original: &Issue,
    analysis: &AnalysisResult,
    markers: &MarkerConfig,
) -> String {
    format!(
        "{}{}",
        original.description().trim_end(),
        marker_block(analysis, markers)
    )
}

/// `Deliverable Criteria: <KEY> - <summary>`
pub fn criteria_summary(original: &Issue, markers: &MarkerConfig) -> String {
    format!(
        "{}: {} - {}",
        markers.criteria,
        original.key,
        original.summary().trim()
    )
}

/// Structured criteria document
///
/// Section headings are the ones the criteria extractor reads back.
pub fn criteria_description(
    original: &Issue,
    analysis: &AnalysisResult,
    workflow: &WorkflowConfig,
) -> String {
    let scenarios = &analysis.test_scenarios;
    let mut doc = String::new();
    doc.push_str(&format!("# {} for {}\n\n", workflow.markers.criteria, original.key));
    doc.push_str(&format!("**Original Issue:** {}\n", original.key));
    doc.push_str(&format!("**Original Summary:** {}\n\n", original.summary().trim()));

    doc.push_str(&format!("## {}\n", FUNCTIONAL_HEADING));
    doc.push_str(&bullets(&analysis.functional_requirements));
    doc.push_str(&format!("\n## {}\n", TECHNICAL_HEADING));
    doc.push_str(&bullets(&analysis.technical_requirements));
    doc.push_str("\n## Quality Requirements\n");
    doc.push_str(&bullets(&analysis.quality_requirements));
    doc.push_str(&format!("\n## {}\n", ACCEPTANCE_HEADING));
    doc.push_str(&bullets(&analysis.acceptance_criteria));
    doc.push_str(&format!("\n## {}\n", DONE_HEADING));
    doc.push_str(&bullets(&analysis.definition_of_done));

    doc.push_str(&format!("\n## {}\n", VALIDATION_HEADING));
    for (title, items) in [
        ("Unit Tests", &scenarios.unit),
        ("Integration Tests", &scenarios.integration),
        ("Edge Cases", &scenarios.edge_cases),
        ("Performance Tests", &scenarios.performance),
    ] {
        if !items.is_empty() {
            doc.push_str(&format!("### {}\n", title));
            doc.push_str(&bullets(items));
        }
    }

    if !analysis.technical_approach.trim().is_empty() {
        doc.push_str("\n## Technical Approach\n");
        doc.push_str(analysis.technical_approach.trim());
        doc.push('\n');
    }

    doc.push_str("\n## Estimated Effort\n");
    doc.push_str(&format!("- Story Points: {}\n", analysis.effort.story_points));
    doc.push_str(&format!("- Hours: {}\n", analysis.effort.hours));
    doc.push_str(&format!("- Complexity: {}\n", analysis.effort.complexity));

    let ready = workflow
        .ready_statuses
        .first()
        .map(String::as_str)
        .unwrap_or("Ready for Implementation");
    doc.push_str("\n----\n");
    doc.push_str(&format!("_{}_\n\n", workflow.markers.generated));
    doc.push_str(&format!(
        "Review these criteria, then move this issue to \"{}\" to generate the implementation.\n",
        ready
    ));
    doc
}

pub fn inquiry_failed_comment(error: &str) -> String {
    format!(
        "Requirements analysis failed: {}\n\nNo criteria issue was created. Fix the cause and \
         recreate or re-trigger this issue.",
        error
    )
}

// =============================================================================
// Shared criteria outcomes
// =============================================================================

pub fn validation_failed_comment(error: &str) -> String {
    format!(
        "This issue was not processed: {}\n\nOnly criteria issues generated by the automation \
         can trigger implementation or evaluation.",
        error
    )
}

pub fn extraction_failed_comment(markers: &MarkerConfig) -> String {
    format!(
        "Could not determine the original issue. Keep the summary in the form \
         \"{}: <KEY> - <summary>\" or add an \"Original Issue: <KEY>\" line to the description.",
        markers.criteria
    )
}

pub fn skipped_comment(stage: Stage, override_label: &str, action: &str) -> String {
    format!(
        "Skipped {}: this issue is already at stage \"{}\". Add the label \"{}\" and move the \
         issue again to run it anyway.",
        action, stage, override_label
    )
}

pub fn system_error_comment(error: &str) -> String {
    format!(
        "Processing failed with an unexpected error: {}\n\nMove the issue again to retry.",
        error
    )
}

// =============================================================================
// Implementation
// =============================================================================

pub fn implementation_failed_comment(error: &str) -> String {
    format!(
        "Implementation generation failed: {}\n\nMove the issue back to a ready status to retry.",
        error
    )
}

pub fn artifacts_failed_comment(original_key: &str, error: &str) -> String {
    format!(
        "The implementation for {} was generated but could not be saved: {}\n\nThe generated \
         deliverable is kept in the processing result for manual recovery.",
        original_key, error
    )
}

pub fn implementation_success_comment(
    original_key: &str,
    result: &ImplementationResult,
    files: &[String],
    testing_status: &str,
) -> String {
    let mut body = format!(
        "Implementation generated for {} ({} deliverable).\n\n{}\n\nFiles created:\n",
        original_key,
        result.deliverable_type,
        result.summary.trim()
    );
    body.push_str(&bullets(files));
    if !result.validation.requirements_pending.is_empty() {
        body.push_str("\nRequirements still pending:\n");
        body.push_str(&bullets(&result.validation.requirements_pending));
    }
    body.push_str(&format!(
        "\nNext steps:\n1. Review the files.\n2. Move this issue to \"{}\" to evaluate them.\n",
        testing_status
    ));
    body
}

// =============================================================================
// Evaluation
// =============================================================================

pub fn implementation_not_found_comment(original_key: &str, error: &str, ready_status: &str) -> String {
    format!(
        "No stored implementation found for {}: {}\n\nMove this issue to \"{}\" to generate the \
         implementation first.",
        original_key, error, ready_status
    )
}

pub fn evaluation_error_comment(error: &str) -> String {
    format!(
        "Evaluation could not be completed: {}\n\nThis is an evaluator failure, not a verdict. \
         Move the issue again to retry.",
        error
    )
}

fn score_table(evaluation: &EvaluationResult, verdict: &Verdict) -> String {
    let scores = evaluation.scores.clamped();
    format!(
        "Overall score: {}/100 (pass mark {})\n- Requirements coverage: {}/25 (minimum {})\n\
         - Technical quality: {}/25\n- Usability: {}/25\n- Documentation: {}/25\n",
        verdict.overall,
        PASS_THRESHOLD,
        scores.requirements_coverage,
        COVERAGE_THRESHOLD,
        scores.technical_quality,
        scores.usability,
        scores.documentation
    )
}

/// `implementation_usage` stands in when the evaluator gave no usage steps
pub fn evaluation_passed_comment(
    original_key: &str,
    evaluation: &EvaluationResult,
    verdict: &Verdict,
    implementation_usage: &[String],
) -> String {
    let mut body = format!("Evaluation PASSED for {}.\n\n", original_key);
    body.push_str(&score_table(evaluation, verdict));
    if !evaluation.narrative.trim().is_empty() {
        body.push('\n');
        body.push_str(evaluation.narrative.trim());
        body.push('\n');
    }
    let usage = if evaluation.usage_instructions.is_empty() {
        implementation_usage
    } else {
        &evaluation.usage_instructions
    };
    if !usage.is_empty() {
        body.push_str("\nUsage:\n");
        body.push_str(&numbered(usage));
    }
    body
}

pub fn evaluation_failed_comment(
    original_key: &str,
    evaluation: &EvaluationResult,
    verdict: &Verdict,
    reimplement_label: &str,
) -> String {
    let mut body = format!("Evaluation FAILED for {}.\n\n", original_key);
    body.push_str(&score_table(evaluation, verdict));
    body.push_str("\nFailed conditions:\n");
    for failure in &verdict.failures {
        body.push_str(&format!("- {}\n", failure.describe()));
    }
    let critical = evaluation.critical_issues();
    if !critical.is_empty() {
        body.push_str("\nCritical issues:\n");
        for issue in critical {
            body.push_str(&format!("- {}\n", issue.format()));
        }
    }
    body.push_str(&format!(
        "\nRevise the implementation (or add the \"{}\" label and move the issue to a ready \
         status), then move it back to testing to resubmit.\n",
        reimplement_label
    ));
    body
}

/// Note appended to the description when no completion transition exists
pub fn completion_note(verdict: &Verdict) -> String {
    format!(
        "\n\n----\nCompleted {}: evaluation passed with {}/100.\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        verdict.overall
    )
}

pub fn completion_comment(done_status: &str) -> String {
    format!(
        "Evaluation passed. The issue could not be moved to \"{}\" automatically; please close it \
         manually.",
        done_status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryScores, EffortEstimate, IssueType, TestScenarios, VerdictFailure};
    use crate::parser::extract_requirements;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            functional_requirements: vec!["Reset password by email".to_string()],
            technical_requirements: vec!["Use the mailer service".to_string()],
            quality_requirements: vec!["p95 under 200ms".to_string()],
            acceptance_criteria: vec!["Email arrives within a minute".to_string()],
            definition_of_done: vec!["Reviewed".to_string()],
            test_scenarios: TestScenarios {
                unit: vec!["token is unique".to_string()],
                integration: Vec::new(),
                edge_cases: vec!["expired token".to_string()],
                performance: Vec::new(),
            },
            technical_approach: "Add a reset endpoint".to_string(),
            effort: EffortEstimate {
                story_points: 3,
                hours: 6.0,
                complexity: "Low".to_string(),
            },
            fallback: false,
        }
    }

    fn original() -> Issue {
        Issue::new("PCP1-67", IssueType::Story, "To Do", "Fix login bug", "Users cannot log in")
    }

    #[test]
    fn test_criteria_summary() {
        assert_eq!(
            criteria_summary(&original(), &MarkerConfig::default()),
            "Deliverable Criteria: PCP1-67 - Fix login bug"
        );
    }

    #[test]
    fn test_criteria_description_reads_back() {
        let workflow = WorkflowConfig::default();
        let doc = criteria_description(&original(), &analysis(), &workflow);

        assert!(doc.contains("**Original Issue:** PCP1-67"));
        assert!(doc.contains("Generated by Claude AI"));
        assert!(doc.contains("\"Ready for Implementation\""));

        let req = extract_requirements(&doc);
        assert_eq!(req.functional, vec!["Reset password by email".to_string()]);
        assert_eq!(req.technical, vec!["Use the mailer service".to_string()]);
        assert_eq!(req.acceptance_criteria, vec!["Email arrives within a minute".to_string()]);
        assert_eq!(req.definition_of_done, vec!["Reviewed".to_string()]);
        assert_eq!(
            req.validation_tests,
            vec!["token is unique".to_string(), "expired token".to_string()]
        );
    }

    #[test]
    fn test_marker_block_appends() {
        let markers = MarkerConfig::default();
        let description = description_with_marker(&original(), &analysis(), &markers);
        assert!(description.starts_with("Users cannot log in"));
        assert_eq!(description.matches("[Claude AI Touched]").count(), 1);
        assert!(description.contains("3 story points, 6 hours, Low complexity"));
        assert!(!description.contains("generic requirements template"));
    }

    fn evaluation(usage: &[&str]) -> EvaluationResult {
        EvaluationResult {
            scores: CategoryScores {
                requirements_coverage: 22,
                technical_quality: 20,
                usability: 20,
                documentation: 20,
            },
            issues: Vec::new(),
            ready_for_deployment: true,
            narrative: String::new(),
            usage_instructions: usage.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_passed_comment_falls_back_to_implementation_usage() {
        let verdict = Verdict {
            passed: true,
            overall: 82,
            failures: Vec::new(),
        };
        let from_implementation = vec!["Run the migration".to_string()];

        let body =
            evaluation_passed_comment("PCP1-66", &evaluation(&[]), &verdict, &from_implementation);
        assert!(body.contains("Usage:\n1. Run the migration"));

        let body = evaluation_passed_comment(
            "PCP1-66",
            &evaluation(&["Call POST /reset"]),
            &verdict,
            &from_implementation,
        );
        assert!(body.contains("1. Call POST /reset"));
        assert!(!body.contains("Run the migration"));

        let body = evaluation_passed_comment("PCP1-66", &evaluation(&[]), &verdict, &[]);
        assert!(!body.contains("Usage:"));
    }

    #[test]
    fn test_failed_comment_names_reimplement_label() {
        let verdict = Verdict {
            passed: false,
            overall: 62,
            failures: vec![VerdictFailure::OverallBelowThreshold],
        };
        let body = evaluation_failed_comment("PCP1-66", &evaluation(&[]), &verdict, "rerun-reimplement");
        assert!(body.contains("\"rerun-reimplement\" label"));
        assert!(!body.contains("force-"));
    }
}
