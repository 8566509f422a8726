//! Jira REST v2 client

use super::{IssueTracker, IssueUpdate, LinkType, NewIssue, Transition};
use crate::error::TrackerError;
use crate::models::{Issue, JiraConfig};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const ISSUE_FIELDS: &str = "summary,description,issuetype,status,labels,project";

pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    token: String,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Deserialize)]
struct TransitionList {
    #[serde(default)]
    transitions: Vec<RawTransition>,
}

#[derive(Deserialize)]
struct RawTransition {
    id: String,
    name: String,
    #[serde(default)]
    to: Option<RawStatus>,
}

#[derive(Deserialize)]
struct RawStatus {
    name: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, TrackerError> {
        if config.base_url.trim().is_empty() {
            return Err(TrackerError::NotConfigured {
                message: "jira.base_url is empty".to_string(),
            });
        }
        let token = config
            .resolved_token()
            .ok_or_else(|| TrackerError::NotConfigured {
                message: "no API token (set JIRA_API_TOKEN or jira.api_token)".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
    }

    /// Map non-success responses to [`TrackerError::Status`]
    async fn check(response: Response) -> Result<Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Status {
            status: status.as_u16(),
            body: truncate(&body, 500),
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn get_issue(&self, key: &str) -> Result<Issue, TrackerError> {
        debug!(key, "GET issue");
        let response = self
            .authed(self.client.get(self.url(&format!("issue/{}", key))))
            .query(&[("fields", ISSUE_FIELDS)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound {
                key: key.to_string(),
            });
        }
        let response = Self::check(response).await?;
        Ok(response.json::<Issue>().await?)
    }

    async fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, TrackerError> {
        debug!(project = %new_issue.project_key, "POST issue");
        let body = json!({
            "fields": {
                "project": { "key": new_issue.project_key },
                "issuetype": { "name": new_issue.issue_type.name() },
                "summary": new_issue.summary,
                "description": new_issue.description,
            }
        });
        let response = self
            .authed(self.client.post(self.url("issue")))
            .json(&body)
            .send()
            .await?;
        let created: CreatedIssue = Self::check(response).await?.json().await?;

        // The create response only carries the key; read the stored snapshot back
        self.get_issue(&created.key).await
    }

    async fn update_issue(&self, key: &str, update: IssueUpdate) -> Result<(), TrackerError> {
        if update.is_empty() {
            return Ok(());
        }
        debug!(key, "PUT issue");
        let response = self
            .authed(self.client.put(self.url(&format!("issue/{}", key))))
            .json(&json!({ "fields": update.to_fields() }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        debug!(key, "POST comment");
        let response = self
            .authed(self.client.post(self.url(&format!("issue/{}/comment", key))))
            .json(&json!({ "body": body }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: LinkType,
    ) -> Result<(), TrackerError> {
        debug!(inward_key, outward_key, "POST issueLink");
        let response = self
            .authed(self.client.post(self.url("issueLink")))
            .json(&json!({
                "type": { "name": link_type.name() },
                "inwardIssue": { "key": inward_key },
                "outwardIssue": { "key": outward_key },
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError> {
        let response = self
            .authed(self.client.get(self.url(&format!("issue/{}/transitions", key))))
            .send()
            .await?;
        let list: TransitionList = Self::check(response).await?.json().await?;
        Ok(list
            .transitions
            .into_iter()
            .map(|t| Transition {
                id: t.id,
                name: t.name,
                to_status: t.to.map(|s| s.name),
            })
            .collect())
    }

    async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        debug!(key, transition_id, "POST transition");
        let response = self
            .authed(self.client.post(self.url(&format!("issue/{}/transitions", key))))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_base_url() {
        let config = JiraConfig::default();
        let err = JiraClient::new(&config).err().unwrap();
        assert!(matches!(err, TrackerError::NotConfigured { .. }));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = JiraConfig {
            base_url: "https://example.atlassian.net/".to_string(),
            email: "bot@example.com".to_string(),
            api_token: Some("secret".to_string()),
            timeout_secs: 5,
        };
        let client = JiraClient::new(&config).unwrap();
        assert_eq!(
            client.url("issue/ABC-1"),
            "https://example.atlassian.net/rest/api/2/issue/ABC-1"
        );
    }

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("short", 10), "short");
        let long = "x".repeat(20);
        assert_eq!(truncate(&long, 5), "xxxxx...");
    }

    #[test]
    fn test_transition_list_decoding() {
        let list: TransitionList = serde_json::from_str(
            r#"{"transitions": [{"id": "31", "name": "Done", "to": {"name": "Done"}}, {"id": "11", "name": "Start"}]}"#,
        )
        .unwrap();
        assert_eq!(list.transitions.len(), 2);
        assert_eq!(list.transitions[0].to.as_ref().unwrap().name, "Done");
        assert!(list.transitions[1].to.is_none());
    }
}
