//! Issue-tracker gateway
//!
//! The pipeline only talks to the tracker through [`IssueTracker`]. Every
//! operation is fallible and callers decide per step whether a failure is
//! fatal, reported, or swallowed.

mod jira;
mod memory;

pub use jira::JiraClient;
pub use memory::{MemoryTracker, TrackerCall, TrackerOp};

use crate::error::TrackerError;
use crate::models::{Issue, IssueType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial field update; only present fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl IssueUpdate {
    pub fn labels(labels: Vec<String>) -> Self {
        Self {
            labels: Some(labels),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.description.is_none() && self.labels.is_none()
    }

    /// Jira `fields` object
    pub fn to_fields(&self) -> Value {
        let mut fields = Map::new();
        if let Some(summary) = &self.summary {
            fields.insert("summary".to_string(), Value::String(summary.clone()));
        }
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(labels) = &self.labels {
            fields.insert(
                "labels".to_string(),
                Value::Array(labels.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(fields)
    }
}

/// Available workflow transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    /// Name of the status the transition leads to
    #[serde(default)]
    pub to_status: Option<String>,
}

/// Tracker-native link types used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Relates,
}

impl LinkType {
    pub fn name(&self) -> &'static str {
        match self {
            LinkType::Relates => "Relates",
        }
    }
}

/// New issue request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project_key: String,
    pub issue_type: IssueType,
    pub summary: String,
    pub description: String,
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, key: &str) -> Result<Issue, TrackerError>;

    async fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, TrackerError>;

    async fn update_issue(&self, key: &str, update: IssueUpdate) -> Result<(), TrackerError>;

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError>;

    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: LinkType,
    ) -> Result<(), TrackerError>;

    async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError>;

    async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<(), TrackerError>;

    /// Replace the full label set
    async fn update_labels(&self, key: &str, labels: Vec<String>) -> Result<(), TrackerError> {
        self.update_issue(key, IssueUpdate::labels(labels)).await
    }
}
