//! Claude CLI invocation
//!
//! Runs `claude -p --model <model> --output-format json` with the prompt piped
//! on stdin and returns the text of the reply.

use super::model_selector::ModelSelector;
use super::ModelClient;
use crate::error::AdapterError;
use crate::models::{ClaudeConfig, Complexity};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Model client backed by the Claude command line tool
pub struct ClaudeCli {
    config: ClaudeConfig,
}

impl ClaudeCli {
    pub fn new(config: ClaudeConfig) -> Self {
        Self { config }
    }

    fn build_args(model: &str) -> Vec<String> {
        vec![
            "-p".to_string(),
            "--model".to_string(),
            model.to_string(),
            "--output-format".to_string(),
            "json".to_string(),
        ]
    }

    async fn run_command(
        &self,
        command_name: &str,
        args: &[String],
        prompt: &str,
    ) -> Result<String, AdapterError> {
        let mut child = Command::new(command_name)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::Invocation {
                message: format!(
                    "command '{}' could not be started ({}); ensure it is installed and in PATH",
                    command_name, e
                ),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| invocation("failed to write prompt to stdin", e))?;
            stdin
                .flush()
                .await
                .map_err(|e| invocation("failed to flush stdin", e))?;
        }

        let stdout = child.stdout.take().ok_or_else(|| AdapterError::Invocation {
            message: "failed to capture stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| AdapterError::Invocation {
            message: "failed to capture stderr".to_string(),
        })?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();
        let mut output = String::new();
        let mut stderr_output = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        // Drain both pipes so a chatty stderr cannot block the child
        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_reader.next_line(), if !stdout_done => {
                    match line {
                        Ok(Some(line)) => {
                            output.push_str(&line);
                            output.push('\n');
                        }
                        Ok(None) => stdout_done = true,
                        Err(e) => return Err(invocation("failed to read stdout", e)),
                    }
                }
                line = stderr_reader.next_line(), if !stderr_done => {
                    match line {
                        Ok(Some(line)) => {
                            stderr_output.push_str(&line);
                            stderr_output.push('\n');
                        }
                        Ok(None) => stderr_done = true,
                        Err(e) => return Err(invocation("failed to read stderr", e)),
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| invocation("failed to wait for command", e))?;
        if !status.success() {
            return Err(AdapterError::Invocation {
                message: format!(
                    "command '{}' failed with exit code {:?}: {}",
                    command_name,
                    status.code(),
                    stderr_output.trim()
                ),
            });
        }

        Ok(output)
    }
}

fn invocation(context: &str, err: std::io::Error) -> AdapterError {
    AdapterError::Invocation {
        message: format!("{}: {}", context, err),
    }
}

/// Unwrap the `--output-format json` envelope
///
/// Output that is not an envelope is returned unchanged.
pub fn unwrap_envelope(stdout: &str) -> Result<String, AdapterError> {
    let trimmed = stdout.trim();
    let Ok(Value::Object(envelope)) = serde_json::from_str::<Value>(trimmed) else {
        return Ok(trimmed.to_string());
    };
    let Some(result) = envelope.get("result") else {
        return Ok(trimmed.to_string());
    };
    if envelope.get("is_error").and_then(Value::as_bool) == Some(true) {
        return Err(AdapterError::Invocation {
            message: result.as_str().unwrap_or("model reported an error").to_string(),
        });
    }
    match result {
        Value::String(text) => Ok(text.clone()),
        other => Ok(other.to_string()),
    }
}

#[async_trait]
impl ModelClient for ClaudeCli {
    async fn complete(&self, prompt: &str, complexity: Complexity) -> Result<String, AdapterError> {
        let selected = ModelSelector::new(&self.config)
            .select(complexity)
            .ok_or_else(|| AdapterError::Invocation {
                message: "no Claude models configured".to_string(),
            })?;
        let args = Self::build_args(&selected.to_cli_arg());
        debug!(model = %selected.model, ?complexity, prompt_len = prompt.len(), "Invoking Claude CLI");

        let seconds = self.config.timeout_secs;
        let output = match tokio::time::timeout(
            Duration::from_secs(seconds),
            self.run_command(&selected.command, &args, prompt),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(model = %selected.model, seconds, "Claude CLI timed out");
                return Err(AdapterError::Timeout { seconds });
            }
        };

        let text = unwrap_envelope(&output)?;
        if text.trim().is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        assert_eq!(
            ClaudeCli::build_args("opus"),
            vec!["-p", "--model", "opus", "--output-format", "json"]
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        let stdout = r#"{"type":"result","is_error":false,"result":"```json\n{}\n```"}"#;
        assert_eq!(unwrap_envelope(stdout).unwrap(), "```json\n{}\n```");

        assert_eq!(unwrap_envelope("plain text\n").unwrap(), "plain text");

        let err = unwrap_envelope(r#"{"is_error":true,"result":"quota exceeded"}"#).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_command_is_invocation_error() {
        let cli = ClaudeCli::new(ClaudeConfig {
            command: "jiraflow-no-such-command".to_string(),
            ..ClaudeConfig::default()
        });
        let err = cli.complete("hello", Complexity::Low).await.unwrap_err();
        assert!(matches!(err, AdapterError::Invocation { .. }));
        assert!(err.to_string().contains("jiraflow-no-such-command"));
    }
}
