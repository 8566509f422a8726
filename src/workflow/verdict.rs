use crate::models::{EvaluationResult, Verdict, VerdictFailure};

/// Minimum overall score (out of 100) to pass
pub const PASS_THRESHOLD: u32 = 80;
/// Minimum requirements-coverage score (out of 25) to pass
pub const COVERAGE_THRESHOLD: u32 = 20;

/// Final pass/fail decision; every condition is mandatory
pub fn compute_verdict(evaluation: &EvaluationResult) -> Verdict {
    let scores = evaluation.scores.clamped();
    let overall = scores.overall();
    let mut failures = Vec::new();

    if overall < PASS_THRESHOLD {
        failures.push(VerdictFailure::OverallBelowThreshold);
    }
    if evaluation.blocking_issue_count() > 0 {
        failures.push(VerdictFailure::BlockingIssues);
    }
    if scores.requirements_coverage < COVERAGE_THRESHOLD {
        failures.push(VerdictFailure::CoverageBelowThreshold);
    }
    if !evaluation.ready_for_deployment {
        failures.push(VerdictFailure::NotDeploymentReady);
    }

    Verdict {
        passed: failures.is_empty(),
        overall,
        failures,
    }
}
