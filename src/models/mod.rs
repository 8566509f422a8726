pub mod analysis;
pub mod classification;
pub mod config;
pub mod evaluation;
pub mod implementation;
pub mod issue;
pub mod outcome;
pub mod stage;

pub use analysis::{AnalysisResult, EffortEstimate, TestScenarios};
pub use classification::{Classification, IgnoreReason};
pub use config::{
    BridgeConfig, ClaudeConfig, ClaudeModelConfig, Complexity, JiraConfig, MarkerConfig,
    ServerConfig, StoreConfig, WorkflowConfig, CONFIG_FILE,
};
pub use evaluation::{
    CategoryScores, ErrorCategory, EvaluationIssue, EvaluationRecord, EvaluationResult, Severity,
    Verdict, VerdictFailure, CATEGORY_MAX,
};
pub use implementation::{
    DeliverableType, ImplementationArtifact, ImplementationResult, SupportingFile,
    ValidationSummary,
};
pub use issue::{
    Changelog, ChangelogItem, EventKind, Issue, IssueFields, IssueType, NamedField, ProjectRef,
    WebhookEvent,
};
pub use outcome::{Action, BestEffort, ProcessOutcome};
pub use stage::{OverrideKind, Stage};
