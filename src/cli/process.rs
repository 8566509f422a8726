use super::{build_processor, read_event};
use crate::models::{BridgeConfig, Issue, IssueType, ProcessOutcome, WebhookEvent};
use crate::parser::KeyExtractor;
use crate::store::{FsArtifactStore, MemoryStore};
use crate::tracker::{JiraClient, MemoryTracker};
use crate::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

/// Run one webhook body through the processor and print the outcome JSON
pub async fn run(config: BridgeConfig, input: &str, dry_run: bool) -> Result<()> {
    let event = read_event(input)?;

    let outcome = if dry_run {
        let tracker = Arc::new(seeded_tracker(&config, &event)?);
        let processor = build_processor(&config, tracker.clone(), Arc::new(MemoryStore::new()))?;
        let outcome = processor.process_webhook(&event).await;

        eprintln!("{}", "Dry run: tracker calls".cyan());
        for call in tracker.calls() {
            eprintln!("   {:?} {}", call.op, call.key);
        }
        outcome
    } else {
        let tracker = JiraClient::new(&config.jira).context("Failed to build Jira client")?;
        let store = FsArtifactStore::new(config.store.root.clone());
        let processor = build_processor(&config, Arc::new(tracker), Arc::new(store))?;
        processor.process_webhook(&event).await
    };

    print_outcome(&outcome)
}

/// Memory tracker holding the event's issue and, for criteria issues, a stub original
fn seeded_tracker(config: &BridgeConfig, event: &WebhookEvent) -> Result<MemoryTracker> {
    let tracker = MemoryTracker::new();
    let Some(issue) = event.issue.clone() else {
        return Ok(tracker);
    };

    let workflow = &config.workflow;
    let extractor = KeyExtractor::new(&workflow.markers.criteria, &workflow.project_keys)
        .context("Invalid key pattern in [workflow]")?;
    if let Ok(original_key) = extractor.extract(&issue) {
        tracker.insert(Issue::new(
            original_key.as_str(),
            IssueType::Story,
            "In Progress",
            format!("Original issue {}", original_key),
            "",
        ));
    }
    tracker.insert(issue);
    Ok(tracker)
}

fn print_outcome(outcome: &ProcessOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome)?;
    println!("{}", json);
    if outcome.is_failure() {
        eprintln!("{}", format!("✗ {}", outcome.action.as_str()).red());
    } else {
        eprintln!("{}", format!("✓ {}", outcome.action.as_str()).green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_tracker_adds_original_for_criteria_issue() {
        let issue = Issue::new(
            "PCP1-67",
            IssueType::Task,
            "Ready for Implementation",
            "Deliverable Criteria: PCP1-66 - Login",
            "**Original Issue:** PCP1-66",
        );
        let event = WebhookEvent::status_changed(issue, "To Do", "Ready for Implementation");

        let tracker = seeded_tracker(&BridgeConfig::default(), &event).unwrap();
        assert!(tracker.issue("PCP1-67").is_some());
        assert!(tracker.issue("PCP1-66").is_some());
    }

    #[test]
    fn test_seeded_tracker_without_issue_is_empty() {
        let event = WebhookEvent {
            webhook_event: "jira:issue_created".to_string(),
            ..Default::default()
        };
        let tracker = seeded_tracker(&BridgeConfig::default(), &event).unwrap();
        assert!(tracker.issues().is_empty());
    }
}
