use crate::error::ErrorKind;
use crate::models::{Classification, EvaluationIssue, ImplementationResult, Stage};
use serde::Serialize;
use serde_json::Value;

/// Result of a fire-and-forget bookkeeping step
///
/// A warned step never changes the outcome of the phase that ran it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BestEffort {
    Applied,
    Warned { step: String, warning: String },
}

impl BestEffort {
    pub fn warned(step: impl Into<String>, warning: impl std::fmt::Display) -> Self {
        BestEffort::Warned {
            step: step.into(),
            warning: warning.to_string(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, BestEffort::Applied)
    }
}

/// Terminal action reported for one webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Ignored,
    CriteriaCreated,
    Skipped,
    ImplementationGenerated,
    ImplementationFailed,
    ArtifactsFailed,
    ImplementationNotFound,
    EvaluationPassed,
    EvaluationFailed,
    ValidationError,
    ExtractionError,
    SystemError,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ignored => "ignored",
            Action::CriteriaCreated => "criteria_created",
            Action::Skipped => "skipped",
            Action::ImplementationGenerated => "implementation_generated",
            Action::ImplementationFailed => "implementation_failed",
            Action::ArtifactsFailed => "artifacts_failed",
            Action::ImplementationNotFound => "implementation_not_found",
            Action::EvaluationPassed => "evaluation_passed",
            Action::EvaluationFailed => "evaluation_failed",
            Action::ValidationError => "validation_error",
            Action::ExtractionError => "extraction_error",
            Action::SystemError => "system_error",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything `process_webhook` reports back to its caller
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub action: Action,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<BestEffort>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
    /// Generated deliverable kept for manual recovery when persistence failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<ImplementationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub critical_issues: Vec<EvaluationIssue>,
}

impl ProcessOutcome {
    pub fn new(action: Action, classification: Classification) -> Self {
        Self {
            action,
            classification,
            issue_key: None,
            original_key: None,
            error_kind: None,
            message: None,
            stage: None,
            warnings: Vec::new(),
            details: Value::Null,
            implementation: None,
            critical_issues: Vec::new(),
        }
    }

    pub fn ignored(classification: Classification, issue_key: Option<&str>) -> Self {
        let mut outcome = Self::new(Action::Ignored, classification);
        outcome.issue_key = issue_key.map(str::to_string);
        outcome
    }

    pub fn failure(
        action: Action,
        classification: Classification,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::new(action, classification);
        outcome.error_kind = Some(kind);
        outcome.message = Some(message.into());
        outcome
    }

    pub fn with_issue(mut self, key: impl Into<String>) -> Self {
        self.issue_key = Some(key.into());
        self
    }

    pub fn with_original(mut self, key: impl Into<String>) -> Self {
        self.original_key = Some(key.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Record a best-effort step; applied steps are not kept
    pub fn note(&mut self, step: BestEffort) {
        if !step.is_applied() {
            self.warnings.push(step);
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_kind.is_some()
    }
}
