use crate::models::BridgeConfig;
use crate::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Write the default config; an existing file is kept unless `force`
pub fn run(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        println!(
            "{}",
            format!("⚠️  {} already exists", path.display()).yellow()
        );
        println!("   Run with --force to overwrite");
        return Ok(false);
    }

    BridgeConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{}", format!("✓ Wrote {}", path.display()).green());
    println!();
    println!("{}", "Next steps:".bold());
    println!("   1. Set [jira].base_url and [jira].email");
    println!("   2. Export JIRA_API_TOKEN");
    println!("   3. Run: jiraflow serve");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CONFIG_FILE;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert!(run(&path, false).unwrap());
        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.claude.command, "claude");
        assert_eq!(config.workflow.stage_label_prefix, "claude-stage-");
        assert_eq!(config.workflow.override_label_prefix, "force-");
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        assert!(!run(&path, false).unwrap());
        assert_eq!(BridgeConfig::load(&path).unwrap().server.port, 9000);

        assert!(run(&path, true).unwrap());
        assert_eq!(BridgeConfig::load(&path).unwrap().server.port, 3456);
    }
}
