use serde::{Deserialize, Serialize};

/// Issue types the pipeline acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    Story,
    Task,
}

impl IssueType {
    /// Parse a tracker issue type name; anything other than Story/Task is unsupported
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "story" => Some(IssueType::Story),
            "task" => Some(IssueType::Task),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IssueType::Story => "Story",
            IssueType::Task => "Task",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `{ "name": ... }` objects used by Jira for type and status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    #[serde(default)]
    pub name: String,
}

impl NamedField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub issuetype: Option<NamedField>,
    #[serde(default)]
    pub status: Option<NamedField>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

/// Snapshot of a tracker issue as delivered by a webhook or fetched by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

impl Issue {
    /// Build an issue snapshot directly (tests, dry runs, created issues)
    pub fn new(
        key: impl Into<String>,
        issue_type: IssueType,
        status: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let project = project_key_of(&key).map(|k| ProjectRef { key: k.to_string() });
        Self {
            key,
            fields: IssueFields {
                summary: summary.into(),
                description: Some(description.into()),
                issuetype: Some(NamedField::new(issue_type.name())),
                status: Some(NamedField::new(status)),
                labels: Vec::new(),
                project,
            },
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn summary(&self) -> &str {
        &self.fields.summary
    }

    pub fn description(&self) -> &str {
        self.fields.description.as_deref().unwrap_or("")
    }

    pub fn status(&self) -> &str {
        self.fields
            .status
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }

    pub fn issue_type(&self) -> Option<IssueType> {
        self.fields
            .issuetype
            .as_ref()
            .and_then(|t| IssueType::parse(&t.name))
    }

    pub fn labels(&self) -> &[String] {
        &self.fields.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.fields.labels.iter().any(|l| l == label)
    }

    /// Project key from the project field, falling back to the key prefix
    pub fn project_key(&self) -> Option<&str> {
        self.fields
            .project
            .as_ref()
            .map(|p| p.key.as_str())
            .filter(|k| !k.is_empty())
            .or_else(|| project_key_of(&self.key))
    }
}

/// `PROJ-12` → `PROJ`
pub fn project_key_of(key: &str) -> Option<&str> {
    key.rsplit_once('-')
        .map(|(project, _)| project)
        .filter(|p| !p.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogItem {
    #[serde(default)]
    pub field: String,
    #[serde(rename = "fromString", default)]
    pub from_value: Option<String>,
    #[serde(rename = "toString", default)]
    pub to_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub items: Vec<ChangelogItem>,
}

impl Changelog {
    /// The status change carried by this changelog, if any
    pub fn status_change(&self) -> Option<&ChangelogItem> {
        self.items
            .iter()
            .find(|item| item.field.eq_ignore_ascii_case("status"))
    }
}

/// Webhook event type, normalized from the tracker's event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Other,
}

/// Inbound webhook body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "webhookEvent", alias = "event_type", default)]
    pub webhook_event: String,
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub changelog: Option<Changelog>,
}

impl WebhookEvent {
    pub fn created(issue: Issue) -> Self {
        Self {
            webhook_event: "jira:issue_created".to_string(),
            issue: Some(issue),
            changelog: None,
        }
    }

    pub fn status_changed(issue: Issue, from: &str, to: &str) -> Self {
        Self {
            webhook_event: "jira:issue_updated".to_string(),
            issue: Some(issue),
            changelog: Some(Changelog {
                items: vec![ChangelogItem {
                    field: "status".to_string(),
                    from_value: Some(from.to_string()),
                    to_value: Some(to.to_string()),
                }],
            }),
        }
    }

    /// Accepts `jira:issue_created`, `issue_created` and bare `created`
    pub fn kind(&self) -> EventKind {
        let name = self.webhook_event.trim().to_lowercase();
        let name = name.strip_prefix("jira:").unwrap_or(&name);
        match name {
            "issue_created" | "created" => EventKind::Created,
            "issue_updated" | "updated" => EventKind::Updated,
            _ => EventKind::Other,
        }
    }

    /// Issue key if the event carries a keyed issue
    pub fn issue_key(&self) -> Option<&str> {
        self.issue
            .as_ref()
            .map(|i| i.key.as_str())
            .filter(|k| !k.is_empty())
    }
}
