// jiraflow - Jira webhook orchestrator
// Moves issues through Claude-driven requirements analysis, implementation and evaluation

pub mod adapters;
pub mod cli;
pub mod error;
pub mod models;
pub mod parser;
pub mod server;
pub mod store;
pub mod tracker;
pub mod workflow;

pub use anyhow::{Context, Result};

// Re-export commonly used types
pub use models::{BridgeConfig, Classification, Issue, ProcessOutcome, WebhookEvent};
pub use workflow::WebhookProcessor;
