use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of deliverable produced by the implementation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliverableType {
    Code,
    Documentation,
    Analysis,
    Process,
    Other,
}

impl DeliverableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverableType::Code => "code",
            DeliverableType::Documentation => "documentation",
            DeliverableType::Analysis => "analysis",
            DeliverableType::Process => "process",
            DeliverableType::Other => "other",
        }
    }

    /// Code and process deliverables ship a generated configuration file
    pub fn has_config(&self) -> bool {
        matches!(self, DeliverableType::Code | DeliverableType::Process)
    }
}

impl std::fmt::Display for DeliverableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named supporting file generated alongside the primary content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingFile {
    pub name: String,
    pub content: String,
}

/// Self-assessment the model returns with its deliverable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    #[serde(default)]
    pub requirements_met: Vec<String>,
    #[serde(default)]
    pub requirements_pending: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

/// Deliverable generated for a criteria issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationResult {
    pub deliverable_type: DeliverableType,
    /// Language of a code deliverable (drives the primary file extension)
    #[serde(default)]
    pub language: Option<String>,
    pub summary: String,
    pub primary_content: String,
    #[serde(default)]
    pub supporting_files: Vec<SupportingFile>,
    #[serde(default)]
    pub validation_tests: Vec<String>,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub usage_instructions: Vec<String>,
    #[serde(default)]
    pub validation: ValidationSummary,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// Persisted implementation as reloaded for evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationArtifact {
    pub original_key: String,
    pub criteria_key: String,
    pub result: ImplementationResult,
    /// File names written to the bundle
    pub files: Vec<String>,
    pub stored_at: DateTime<Utc>,
}
