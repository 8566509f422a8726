use crate::models::{ClaudeConfig, Complexity};

/// Model picked for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedModel {
    pub model: String,
    pub command: String,
}

impl SelectedModel {
    /// Get the CLI argument for the selected model
    pub fn to_cli_arg(&self) -> String {
        self.model.clone()
    }
}

/// Chooses a Claude model based on task complexity
pub struct ModelSelector<'a> {
    config: &'a ClaudeConfig,
}

impl<'a> ModelSelector<'a> {
    pub fn new(config: &'a ClaudeConfig) -> Self {
        Self { config }
    }

    /// Smallest configured model that covers `complexity`
    ///
    /// Falls back to the default model, and to `None` only when the model
    /// table is empty.
    pub fn select(&self, complexity: Complexity) -> Option<SelectedModel> {
        self.config.select_model(complexity).map(|m| SelectedModel {
            model: m.model.clone(),
            command: self.config.command.clone(),
        })
    }
}
