use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum score of a single evaluation category
pub const CATEGORY_MAX: u32 = 25;

/// Severity of an evaluation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Blocking severities fail the evaluation outright
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCategory {
    Functional,
    Technical,
    Usability,
    Documentation,
}

impl ErrorCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Functional => "FUNCTIONAL",
            ErrorCategory::Technical => "TECHNICAL",
            ErrorCategory::Usability => "USABILITY",
            ErrorCategory::Documentation => "DOCUMENTATION",
        }
    }
}

/// One finding reported by the evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationIssue {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl EvaluationIssue {
    pub fn format(&self) -> String {
        match &self.recommendation {
            Some(fix) => format!(
                "[{}/{}] {} (fix: {})",
                self.severity.name(),
                self.category.name(),
                self.description,
                fix
            ),
            None => format!(
                "[{}/{}] {}",
                self.severity.name(),
                self.category.name(),
                self.description
            ),
        }
    }
}

/// Four-dimension score breakdown, each 0–25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub requirements_coverage: u32,
    pub technical_quality: u32,
    pub usability: u32,
    pub documentation: u32,
}

impl CategoryScores {
    /// Clamp every category into 0–25
    pub fn clamped(self) -> Self {
        Self {
            requirements_coverage: self.requirements_coverage.min(CATEGORY_MAX),
            technical_quality: self.technical_quality.min(CATEGORY_MAX),
            usability: self.usability.min(CATEGORY_MAX),
            documentation: self.documentation.min(CATEGORY_MAX),
        }
    }

    /// Overall 0–100 score
    pub fn overall(&self) -> u32 {
        let c = self.clamped();
        c.requirements_coverage + c.technical_quality + c.usability + c.documentation
    }
}

/// Structured evaluation returned by the evaluation adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: CategoryScores,
    #[serde(default)]
    pub issues: Vec<EvaluationIssue>,
    pub ready_for_deployment: bool,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub usage_instructions: Vec<String>,
}

impl EvaluationResult {
    pub fn critical_issues(&self) -> Vec<&EvaluationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .collect()
    }

    pub fn blocking_issue_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity.is_blocking()).count()
    }
}

/// Condition a failed verdict did not meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictFailure {
    OverallBelowThreshold,
    BlockingIssues,
    CoverageBelowThreshold,
    NotDeploymentReady,
}

impl VerdictFailure {
    pub fn describe(&self) -> &'static str {
        match self {
            VerdictFailure::OverallBelowThreshold => "overall score below threshold",
            VerdictFailure::BlockingIssues => "CRITICAL or HIGH issues present",
            VerdictFailure::CoverageBelowThreshold => "requirements coverage below threshold",
            VerdictFailure::NotDeploymentReady => "evaluator did not mark it deployment ready",
        }
    }
}

/// Final pass/fail decision computed from an [`EvaluationResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub overall: u32,
    pub failures: Vec<VerdictFailure>,
}

/// Persisted evaluation bundle contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub original_key: String,
    pub criteria_key: String,
    pub evaluation: EvaluationResult,
    pub verdict: Verdict,
    pub evaluated_at: DateTime<Utc>,
}
