use super::build_processor;
use crate::models::BridgeConfig;
use crate::server;
use crate::store::FsArtifactStore;
use crate::tracker::JiraClient;
use crate::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

/// Start the webhook server against the configured Jira site
pub async fn run(config: BridgeConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    if config.jira.base_url.trim().is_empty() {
        anyhow::bail!("[jira].base_url is not set; run `jiraflow init` and edit the config");
    }
    let tracker = JiraClient::new(&config.jira).context("Failed to build Jira client")?;
    let store = FsArtifactStore::new(config.store.root.clone());

    println!("{}", "🚀 Starting jiraflow webhook server...".cyan());
    println!("   Jira:      {}", config.jira.base_url);
    println!("   Artifacts: {}", store.root().display());
    info!(
        jira = %config.jira.base_url,
        artifacts = %store.root().display(),
        "Starting webhook server"
    );

    let processor = build_processor(&config, Arc::new(tracker), Arc::new(store))?;
    server::start_server(&host, port, Arc::new(processor)).await
}
