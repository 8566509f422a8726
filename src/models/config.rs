use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, resolved against the working directory
pub const CONFIG_FILE: &str = "jiraflow.toml";

// =============================================================================
// Model Configuration
// =============================================================================

/// Task complexity level for model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Short structured answers
    Low,
    /// Requirements analysis
    #[default]
    Medium,
    /// Generating or grading a deliverable
    High,
    /// Architectural or high-risk work
    Critical,
}

/// Claude model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeModelConfig {
    /// Model identifier (e.g., "fast", "balanced", "deep")
    pub id: String,
    /// Model name (e.g., "haiku", "sonnet", "opus")
    pub model: String,
    /// Maximum complexity this model handles
    pub complexity: Complexity,
}

/// Claude configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// CLI command (default: "claude")
    #[serde(default = "default_claude_command")]
    pub command: String,
    /// Available models
    #[serde(default = "default_claude_models")]
    pub models: Vec<ClaudeModelConfig>,
    /// Default model ID
    #[serde(default = "default_claude_default")]
    pub default: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_claude_timeout")]
    pub timeout_secs: u64,
}

fn default_claude_command() -> String {
    "claude".to_string()
}

fn default_claude_models() -> Vec<ClaudeModelConfig> {
    vec![
        ClaudeModelConfig {
            id: "fast".to_string(),
            model: "haiku".to_string(),
            complexity: Complexity::Low,
        },
        ClaudeModelConfig {
            id: "balanced".to_string(),
            model: "sonnet".to_string(),
            complexity: Complexity::Medium,
        },
        ClaudeModelConfig {
            id: "deep".to_string(),
            model: "opus".to_string(),
            complexity: Complexity::Critical,
        },
    ]
}

fn default_claude_default() -> String {
    "balanced".to_string()
}

fn default_claude_timeout() -> u64 {
    600
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            command: default_claude_command(),
            models: default_claude_models(),
            default: default_claude_default(),
            timeout_secs: default_claude_timeout(),
        }
    }
}

impl ClaudeConfig {
    /// Select the smallest model that handles the complexity, else the default
    pub fn select_model(&self, complexity: Complexity) -> Option<&ClaudeModelConfig> {
        self.models
            .iter()
            .filter(|m| m.complexity as u8 >= complexity as u8)
            .min_by_key(|m| m.complexity as u8)
            .or_else(|| self.default_model())
    }

    /// Get default model
    pub fn default_model(&self) -> Option<&ClaudeModelConfig> {
        self.models
            .iter()
            .find(|m| m.id == self.default)
            .or_else(|| self.models.first())
    }
}

// =============================================================================
// Tracker / Store / Server
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Site base URL, e.g. https://example.atlassian.net
    #[serde(default)]
    pub base_url: String,
    /// Account email used for basic auth
    #[serde(default)]
    pub email: String,
    /// API token; `JIRA_API_TOKEN` overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_jira_timeout")]
    pub timeout_secs: u64,
}

fn default_jira_timeout() -> u64 {
    30
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            api_token: None,
            timeout_secs: default_jira_timeout(),
        }
    }
}

impl JiraConfig {
    /// Token from the environment, falling back to the config file
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var("JIRA_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.api_token.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of artifact bundles
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("jiraflow/artifacts")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3456
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// =============================================================================
// Workflow Rules
// =============================================================================

/// Provenance marker strings scanned by the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Summary marker of criteria issues
    #[serde(default = "default_criteria_marker")]
    pub criteria: String,
    /// Appended to original issues after analysis
    #[serde(default = "default_touched_marker")]
    pub touched: String,
    /// Closes every generated criteria description
    #[serde(default = "default_generated_marker")]
    pub generated: String,
    /// Summary prefix used when no completion transition exists
    #[serde(default = "default_completed_prefix")]
    pub completed_prefix: String,
}

fn default_criteria_marker() -> String {
    "Deliverable Criteria".to_string()
}

fn default_touched_marker() -> String {
    "[Claude AI Touched]".to_string()
}

fn default_generated_marker() -> String {
    "Generated by Claude AI".to_string()
}

fn default_completed_prefix() -> String {
    "[COMPLETED]".to_string()
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            criteria: default_criteria_marker(),
            touched: default_touched_marker(),
            generated: default_generated_marker(),
            completed_prefix: default_completed_prefix(),
        }
    }
}

impl MarkerConfig {
    /// Every marker that indicates prior automation
    pub fn provenance_markers(&self) -> [&str; 3] {
        [&self.criteria, &self.touched, &self.generated]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Statuses that trigger implementation generation
    #[serde(default = "default_ready_statuses")]
    pub ready_statuses: Vec<String>,
    /// Status that triggers evaluation
    #[serde(default = "default_testing_status")]
    pub testing_status: String,
    /// Completion status for passed Story criteria
    #[serde(default = "default_done_status")]
    pub story_done_status: String,
    /// Completion status for passed Task criteria
    #[serde(default = "default_done_status")]
    pub task_done_status: String,
    /// Project keys tried first when extracting original issue keys
    #[serde(default)]
    pub project_keys: Vec<String>,
    /// Prefix of stage labels
    #[serde(default = "default_stage_prefix")]
    pub stage_label_prefix: String,
    /// Prefix of the labels that force a re-run
    #[serde(default = "default_override_prefix")]
    pub override_label_prefix: String,
    #[serde(default)]
    pub markers: MarkerConfig,
}

fn default_ready_statuses() -> Vec<String> {
    vec![
        "Ready for Implementation".to_string(),
        "In Progress".to_string(),
        "Ready for Development".to_string(),
    ]
}

fn default_testing_status() -> String {
    "Testing Criteria".to_string()
}

fn default_done_status() -> String {
    "Done".to_string()
}

fn default_stage_prefix() -> String {
    "claude-stage-".to_string()
}

fn default_override_prefix() -> String {
    "force-".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            ready_statuses: default_ready_statuses(),
            testing_status: default_testing_status(),
            story_done_status: default_done_status(),
            task_done_status: default_done_status(),
            project_keys: Vec::new(),
            stage_label_prefix: default_stage_prefix(),
            override_label_prefix: default_override_prefix(),
            markers: MarkerConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn is_ready_status(&self, status: &str) -> bool {
        self.ready_statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status.trim()))
    }

    pub fn is_testing_status(&self, status: &str) -> bool {
        self.testing_status.eq_ignore_ascii_case(status.trim())
    }

    /// Ready statuses plus the testing status
    pub fn is_actionable_status(&self, status: &str) -> bool {
        self.is_ready_status(status) || self.is_testing_status(status)
    }
}

// =============================================================================
// Bridge Configuration
// =============================================================================

/// Top-level configuration, injected into each collaborator at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub claude: ClaudeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl BridgeConfig {
    /// Load config from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config as pretty TOML
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BridgeConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.server.port, 3456);
        assert_eq!(config.workflow.testing_status, "Testing Criteria");
        assert_eq!(config.workflow.ready_statuses.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[jira]
base_url = "https://example.atlassian.net"
email = "bot@example.com"

[workflow]
project_keys = ["PCP1"]
story_done_status = "Accepted"
override_label_prefix = "rerun-"
"#,
        )
        .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.jira.base_url, "https://example.atlassian.net");
        assert_eq!(config.jira.timeout_secs, 30);
        assert_eq!(config.workflow.project_keys, vec!["PCP1".to_string()]);
        assert_eq!(config.workflow.story_done_status, "Accepted");
        assert_eq!(config.workflow.task_done_status, "Done");
        assert_eq!(config.workflow.stage_label_prefix, "claude-stage-");
        assert_eq!(config.workflow.override_label_prefix, "rerun-");
        assert_eq!(config.workflow.markers.criteria, "Deliverable Criteria");
        assert_eq!(config.claude.command, "claude");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = BridgeConfig::default();
        config.server.port = 9000;
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_status_matching_is_case_insensitive() {
        let workflow = WorkflowConfig::default();
        assert!(workflow.is_ready_status("ready for implementation"));
        assert!(workflow.is_testing_status(" Testing Criteria "));
        assert!(workflow.is_actionable_status("In Progress"));
        assert!(!workflow.is_actionable_status("Done"));
    }

    #[test]
    fn test_select_model_by_complexity() {
        let claude = ClaudeConfig::default();
        assert_eq!(claude.select_model(Complexity::Low).unwrap().model, "haiku");
        assert_eq!(claude.select_model(Complexity::Medium).unwrap().model, "sonnet");
        assert_eq!(claude.select_model(Complexity::High).unwrap().model, "opus");
        assert_eq!(claude.default_model().unwrap().model, "sonnet");

        // No model covers Critical: the default answers
        let capped = ClaudeConfig {
            models: claude.models[..2].to_vec(),
            ..ClaudeConfig::default()
        };
        assert_eq!(capped.select_model(Complexity::Critical).unwrap().model, "sonnet");

        let empty = ClaudeConfig {
            models: Vec::new(),
            ..ClaudeConfig::default()
        };
        assert!(empty.select_model(Complexity::High).is_none());
    }
}
