//! Command implementations behind the `jiraflow` binary

pub mod classify;
pub mod init;
pub mod process;
pub mod serve;

use crate::adapters::{ClaudeAdapter, ClaudeCli};
use crate::models::{BridgeConfig, WebhookEvent};
use crate::store::ArtifactStore;
use crate::tracker::IssueTracker;
use crate::workflow::WebhookProcessor;
use crate::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Read a webhook body from a file, or stdin when `input` is `-`
pub fn read_event(input: &str) -> Result<WebhookEvent> {
    let body = if input == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read webhook body from stdin")?;
        body
    } else {
        std::fs::read_to_string(Path::new(input))
            .with_context(|| format!("Failed to read webhook body from {}", input))?
    };
    serde_json::from_str(&body).context("Webhook body is not a valid Jira event")
}

/// Wire the processor around a tracker and store, with the Claude CLI as model
pub fn build_processor(
    config: &BridgeConfig,
    tracker: Arc<dyn IssueTracker>,
    store: Arc<dyn ArtifactStore>,
) -> Result<WebhookProcessor> {
    let model = Arc::new(ClaudeCli::new(config.claude.clone()));
    let adapter = Arc::new(ClaudeAdapter::new(model, store.clone()));
    WebhookProcessor::new(config.workflow.clone(), tracker, adapter, store)
        .context("Invalid key pattern in [workflow]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use tempfile::TempDir;

    #[test]
    fn test_read_event_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"webhookEvent":"jira:issue_created","issue":{"key":"PCP1-1","fields":{"summary":"Login"}}}"#,
        )
        .unwrap();

        let event = read_event(path.to_str().unwrap()).unwrap();
        assert_eq!(event.kind(), EventKind::Created);
        assert_eq!(event.issue_key(), Some("PCP1-1"));
    }

    #[test]
    fn test_read_event_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, "not json").unwrap();

        let err = read_event(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a valid Jira event"));
    }

    #[test]
    fn test_read_event_missing_file() {
        assert!(read_event("/nonexistent/event.json").is_err());
    }
}
