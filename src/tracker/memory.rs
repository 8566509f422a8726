//! In-memory tracker used by dry runs and tests

use super::{IssueTracker, IssueUpdate, LinkType, NewIssue, Transition};
use crate::error::TrackerError;
use crate::models::{Issue, IssueFields, NamedField, ProjectRef};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Tracker operation, used to record calls and inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerOp {
    GetIssue,
    CreateIssue,
    UpdateIssue,
    AddComment,
    LinkIssues,
    GetTransitions,
    TransitionIssue,
}

/// One recorded tracker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCall {
    pub op: TrackerOp,
    pub key: String,
}

#[derive(Default)]
struct State {
    issues: BTreeMap<String, Issue>,
    comments: BTreeMap<String, Vec<String>>,
    links: Vec<(String, String, &'static str)>,
    transitions: BTreeMap<String, Vec<Transition>>,
    next_number: BTreeMap<String, u32>,
    calls: Vec<TrackerCall>,
    failing: HashSet<TrackerOp>,
}

/// Tracker backed by a map of issue snapshots
#[derive(Default)]
pub struct MemoryTracker {
    state: Mutex<State>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test thread panicked mid-call
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, issue: Issue) {
        self.lock().issues.insert(issue.key.clone(), issue);
    }

    pub fn issue(&self, key: &str) -> Option<Issue> {
        self.lock().issues.get(key).cloned()
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.lock().issues.values().cloned().collect()
    }

    pub fn comments(&self, key: &str) -> Vec<String> {
        self.lock().comments.get(key).cloned().unwrap_or_default()
    }

    pub fn links(&self) -> Vec<(String, String, &'static str)> {
        self.lock().links.clone()
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: TrackerOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    /// Transitions offered for an issue
    pub fn set_transitions(&self, key: &str, transitions: Vec<Transition>) {
        self.lock().transitions.insert(key.to_string(), transitions);
    }

    /// Make every subsequent call of `op` fail with a 500
    pub fn fail(&self, op: TrackerOp) {
        self.lock().failing.insert(op);
    }

    fn enter(&self, op: TrackerOp, key: &str) -> Result<MutexGuard<'_, State>, TrackerError> {
        let mut state = self.lock();
        state.calls.push(TrackerCall {
            op,
            key: key.to_string(),
        });
        if state.failing.contains(&op) {
            return Err(TrackerError::Status {
                status: 500,
                body: format!("injected {:?} failure", op),
            });
        }
        Ok(state)
    }
}

fn not_found(key: &str) -> TrackerError {
    TrackerError::NotFound {
        key: key.to_string(),
    }
}

#[async_trait]
impl IssueTracker for MemoryTracker {
    async fn get_issue(&self, key: &str) -> Result<Issue, TrackerError> {
        let state = self.enter(TrackerOp::GetIssue, key)?;
        state.issues.get(key).cloned().ok_or_else(|| not_found(key))
    }

    async fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, TrackerError> {
        let mut state = self.enter(TrackerOp::CreateIssue, &new_issue.project_key)?;
        let number = {
            let highest = state
                .issues
                .keys()
                .filter_map(|k| k.strip_prefix(&format!("{}-", new_issue.project_key))?.parse::<u32>().ok())
                .max()
                .unwrap_or(0);
            let counter = state
                .next_number
                .entry(new_issue.project_key.clone())
                .or_insert(0);
            *counter = (*counter).max(highest) + 1;
            *counter
        };

        let key = format!("{}-{}", new_issue.project_key, number);
        let issue = Issue {
            key: key.clone(),
            fields: IssueFields {
                summary: new_issue.summary,
                description: Some(new_issue.description),
                issuetype: Some(NamedField::new(new_issue.issue_type.name())),
                status: Some(NamedField::new("To Do")),
                labels: Vec::new(),
                project: Some(ProjectRef {
                    key: new_issue.project_key,
                }),
            },
        };
        state.issues.insert(key, issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, key: &str, update: IssueUpdate) -> Result<(), TrackerError> {
        let mut state = self.enter(TrackerOp::UpdateIssue, key)?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        if let Some(summary) = update.summary {
            issue.fields.summary = summary;
        }
        if let Some(description) = update.description {
            issue.fields.description = Some(description);
        }
        if let Some(labels) = update.labels {
            issue.fields.labels = labels;
        }
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        let mut state = self.enter(TrackerOp::AddComment, key)?;
        if !state.issues.contains_key(key) {
            return Err(not_found(key));
        }
        state
            .comments
            .entry(key.to_string())
            .or_default()
            .push(body.to_string());
        Ok(())
    }

    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: LinkType,
    ) -> Result<(), TrackerError> {
        let mut state = self.enter(TrackerOp::LinkIssues, inward_key)?;
        for key in [inward_key, outward_key] {
            if !state.issues.contains_key(key) {
                return Err(not_found(key));
            }
        }
        state
            .links
            .push((inward_key.to_string(), outward_key.to_string(), link_type.name()));
        Ok(())
    }

    async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError> {
        let state = self.enter(TrackerOp::GetTransitions, key)?;
        if !state.issues.contains_key(key) {
            return Err(not_found(key));
        }
        Ok(state.transitions.get(key).cloned().unwrap_or_default())
    }

    async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        let mut state = self.enter(TrackerOp::TransitionIssue, key)?;
        let target = state
            .transitions
            .get(key)
            .and_then(|ts| ts.iter().find(|t| t.id == transition_id))
            .map(|t| t.to_status.clone().unwrap_or_else(|| t.name.clone()))
            .ok_or_else(|| TrackerError::Status {
                status: 400,
                body: format!("transition {} is not valid for {}", transition_id, key),
            })?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        issue.fields.status = Some(NamedField::new(target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueType;

    fn new_task(project: &str) -> NewIssue {
        NewIssue {
            project_key: project.to_string(),
            issue_type: IssueType::Task,
            summary: "Generated".to_string(),
            description: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_continues_numbering() {
        let tracker = MemoryTracker::new();
        tracker.insert(Issue::new("PCP1-67", IssueType::Story, "To Do", "Login", ""));

        let created = tracker.create_issue(new_task("PCP1")).await.unwrap();
        assert_eq!(created.key, "PCP1-68");
        let created = tracker.create_issue(new_task("PCP1")).await.unwrap();
        assert_eq!(created.key, "PCP1-69");
        assert_eq!(created.issue_type(), Some(IssueType::Task));
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let tracker = MemoryTracker::new();
        tracker.insert(Issue::new("ABC-1", IssueType::Task, "To Do", "s", "d"));
        tracker.fail(TrackerOp::AddComment);

        let err = tracker.add_comment("ABC-1", "hello").await.unwrap_err();
        assert!(matches!(err, TrackerError::Status { status: 500, .. }));
        assert_eq!(tracker.call_count(TrackerOp::AddComment), 1);
        assert!(tracker.comments("ABC-1").is_empty());
        tracker.update_labels("ABC-1", vec!["x".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_transition_sets_target_status() {
        let tracker = MemoryTracker::new();
        tracker.insert(Issue::new("ABC-1", IssueType::Task, "Testing Criteria", "s", "d"));
        tracker.set_transitions(
            "ABC-1",
            vec![Transition {
                id: "31".to_string(),
                name: "Complete".to_string(),
                to_status: Some("Done".to_string()),
            }],
        );

        tracker.transition_issue("ABC-1", "31").await.unwrap();
        assert_eq!(tracker.issue("ABC-1").unwrap().status(), "Done");
        assert!(tracker.transition_issue("ABC-1", "99").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_issue_not_found() {
        let tracker = MemoryTracker::new();
        let err = tracker.get_issue("NOPE-1").await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }
}
