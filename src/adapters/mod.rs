//! AI adapters
//!
//! A [`ModelClient`] turns a prompt into reply text; [`ClaudeAdapter`] builds
//! the prompts for the three pipeline calls and validates the JSON replies.

mod claude;
pub mod model_selector;
pub mod prompts;
mod runner;
pub mod schema;
mod scripted;

pub use claude::{fallback_analysis, parse_reply, ClaudeAdapter};
pub use model_selector::{ModelSelector, SelectedModel};
pub use runner::{unwrap_envelope, ClaudeCli};
pub use schema::ResponseSchema;
pub use scripted::ScriptedModel;

use crate::error::AdapterError;
use crate::models::{
    AnalysisResult, Complexity, EvaluationResult, ImplementationArtifact, ImplementationResult,
    Issue,
};
use crate::parser::CriteriaRequirements;
use async_trait::async_trait;

/// Something that answers a prompt
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str, complexity: Complexity) -> Result<String, AdapterError>;
}

/// The three AI-backed steps of the pipeline
#[async_trait]
pub trait AiAdapter: Send + Sync {
    /// Structured requirements for a human-authored issue
    ///
    /// Unparseable replies yield the generic fallback template instead of an
    /// error; only failures to reach the model are returned.
    async fn analyze_requirements(&self, issue: &Issue) -> Result<AnalysisResult, AdapterError>;

    async fn generate_implementation(
        &self,
        criteria: &Issue,
        original_key: &str,
        requirements: &CriteriaRequirements,
    ) -> Result<ImplementationResult, AdapterError>;

    /// Grade the stored implementation, reading its raw files
    async fn evaluate_implementation(
        &self,
        criteria: &Issue,
        original_key: &str,
        artifact: &ImplementationArtifact,
    ) -> Result<EvaluationResult, AdapterError>;
}
