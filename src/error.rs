//! Error types for the webhook pipeline
//!
//! Each collaborator boundary (tracker, AI adapters, artifact store) has its
//! own error enum. [`ErrorKind`] is the flat taxonomy reported back to callers
//! and mirrored in tracker comments.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy reported on every failed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unrecognized input
    ValidationError,
    /// The original issue key could not be recovered
    ExtractionError,
    /// AI call or response parsing failed
    AdapterFailure,
    /// Artifact write or read failed
    PersistenceFailure,
    /// Any issue tracker call failed
    TrackerFailure,
    /// Anything unexpected
    SystemError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ExtractionError => "extraction_error",
            ErrorKind::AdapterFailure => "adapter_failure",
            ErrorKind::PersistenceFailure => "persistence_failure",
            ErrorKind::TrackerFailure => "tracker_failure",
            ErrorKind::SystemError => "system_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("issue not found: {key}")]
    NotFound { key: String },
    #[error("tracker returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("failed to decode tracker response: {message}")]
    Decode { message: String },
    #[error("tracker not configured: {message}")]
    NotConfigured { message: String },
}

impl From<reqwest::Error> for TrackerError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            TrackerError::Decode {
                message: value.to_string(),
            }
        } else {
            TrackerError::Transport {
                message: value.to_string(),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("model invocation failed: {message}")]
    Invocation { message: String },
    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("no JSON object found in model response")]
    NoJson,
    #[error("model response is not valid JSON: {message}")]
    Parse { message: String },
    #[error("model response does not match the {schema} schema: {}", violations.join("; "))]
    Schema {
        schema: &'static str,
        violations: Vec<String>,
    },
    #[error("failed to load implementation files: {message}")]
    Artifacts { message: String },
}

impl AdapterError {
    /// Whether the failure came from the shape of the model output rather
    /// than from calling the model at all
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            AdapterError::EmptyResponse
                | AdapterError::NoJson
                | AdapterError::Parse { .. }
                | AdapterError::Schema { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {phase} artifacts stored for {issue_key}")]
    NotFound { issue_key: String, phase: String },
    #[error("invalid artifact path component: {name}")]
    InvalidName { name: String },
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact {file} is unreadable: {message}")]
    Decode { file: String, message: String },
}

#[derive(Debug, Error)]
#[error("could not extract original issue key from criteria issue {criteria_key}")]
pub struct ExtractionError {
    pub criteria_key: String,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("summary of {key} does not carry the criteria marker")]
    MissingCriteriaMarker { key: String },
    #[error("description of {key} does not carry the generated-by marker")]
    MissingGeneratedMarker { key: String },
    #[error("cannot determine the project of {key}")]
    MissingProject { key: String },
}

/// Error escaping the initial-inquiry phase
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PhaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PhaseError::Tracker(_) => ErrorKind::TrackerFailure,
            PhaseError::Adapter(_) => ErrorKind::AdapterFailure,
            PhaseError::Store(_) => ErrorKind::PersistenceFailure,
            PhaseError::Extraction(_) => ErrorKind::ExtractionError,
            PhaseError::Validation(_) => ErrorKind::ValidationError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_error_kind_mapping() {
        let err = PhaseError::from(TrackerError::NotFound {
            key: "ABC-1".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::TrackerFailure);

        let err = PhaseError::from(ExtractionError {
            criteria_key: "ABC-2".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::ExtractionError);
    }

    #[test]
    fn test_schema_error_lists_violations() {
        let err = AdapterError::Schema {
            schema: "evaluation",
            violations: vec!["/scores: missing".to_string(), "/verdict: bad".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("evaluation"));
        assert!(message.contains("/scores: missing; /verdict: bad"));
        assert!(err.is_parse_failure());
        assert!(!AdapterError::Timeout { seconds: 5 }.is_parse_failure());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PersistenceFailure).unwrap();
        assert_eq!(json, "\"persistence_failure\"");
        assert_eq!(ErrorKind::SystemError.to_string(), "system_error");
    }
}
