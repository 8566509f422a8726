use super::read_event;
use crate::models::{Classification, WorkflowConfig};
use crate::workflow;
use crate::Result;
use colored::Colorize;

/// Print how an event would be routed, without touching any collaborator
pub fn run(rules: &WorkflowConfig, input: &str) -> Result<()> {
    let event = read_event(input)?;
    let classification = workflow::classify(&event, rules);

    let label = classification.as_str();
    match classification {
        Classification::Ignore(reason) => {
            println!("{} ({})", label.yellow(), reason.describe());
        }
        _ => println!("{}", label.green().bold()),
    }
    if let Some(key) = event.issue_key() {
        println!("   Issue: {}", key);
    }
    Ok(())
}
