//! Router behavior driven through `tower::ServiceExt::oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use jiraflow::adapters::{ClaudeAdapter, ScriptedModel};
use jiraflow::models::WorkflowConfig;
use jiraflow::server::router;
use jiraflow::store::MemoryStore;
use jiraflow::tracker::MemoryTracker;
use jiraflow::WebhookProcessor;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(tracker: Arc<MemoryTracker>, model: Arc<ScriptedModel>) -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    let adapter = Arc::new(ClaudeAdapter::new(model, store.clone()));
    let processor =
        WebhookProcessor::new(WorkflowConfig::default(), tracker, adapter, store).unwrap();
    router(Arc::new(processor))
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(Arc::new(MemoryTracker::new()), Arc::new(ScriptedModel::new()));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_malformed_body_is_rejected_before_processing() {
    let tracker = Arc::new(MemoryTracker::new());
    let model = Arc::new(ScriptedModel::new());
    let app = app(tracker.clone(), model.clone());

    let response = app.oneshot(post("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid webhook body"));
    assert!(tracker.calls().is_empty());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_ignored_event_returns_outcome() {
    let tracker = Arc::new(MemoryTracker::new());
    let app = app(tracker.clone(), Arc::new(ScriptedModel::new()));

    let response = app
        .oneshot(post(
            r#"{"webhookEvent": "jira:issue_updated",
                "issue": {"key": "PCP1-66", "fields": {"summary": "Fix login", "issuetype": {"name": "Story"}, "status": {"name": "In Progress"}}},
                "changelog": {"items": [{"field": "assignee", "fromString": "a", "toString": "b"}]}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["action"], "ignored");
    assert_eq!(body["issue_key"], "PCP1-66");
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn test_created_story_runs_initial_inquiry() {
    let tracker = Arc::new(MemoryTracker::new());
    let model = Arc::new(ScriptedModel::new());
    model.reply("not json, so the fallback template is used");
    let body = r#"{"webhookEvent": "jira:issue_created",
        "issue": {"key": "PCP1-66", "fields": {"summary": "Fix login", "description": "SSO is broken",
            "issuetype": {"name": "Story"}, "status": {"name": "To Do"}, "project": {"key": "PCP1"}}}}"#;
    let event: jiraflow::WebhookEvent = serde_json::from_str(body).unwrap();
    tracker.insert(event.issue.unwrap());
    let app = app(tracker.clone(), model);

    let response = app.oneshot(post(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["action"], "criteria_created");
    assert_eq!(outcome["classification"], "initial_inquiry");
    assert_eq!(outcome["details"]["analysis"]["fallback"], true);
    assert_eq!(tracker.issues().len(), 2);
}
