use serde::{Deserialize, Serialize};

/// Furthest-completed automation phase of a criteria issue
///
/// Stored in the tracker as at most one stage label; converted to and from
/// labels only at that boundary. Variants are ordered so that `max` picks the
/// furthest stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    None,
    Analyzed,
    Implemented,
    Tested,
}

impl Stage {
    /// Stages that are encoded as labels
    pub const LABELLED: [Stage; 3] = [Stage::Analyzed, Stage::Implemented, Stage::Tested];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::None => "none",
            Stage::Analyzed => "analyzed",
            Stage::Implemented => "implemented",
            Stage::Tested => "tested",
        }
    }

    /// Label for this stage under the given prefix; `None` has no label
    pub fn label(&self, prefix: &str) -> Option<String> {
        match self {
            Stage::None => None,
            other => Some(format!("{}{}", prefix, other.as_str())),
        }
    }

    /// Stage encoded by a single label, if it is a stage label
    pub fn from_label(label: &str, prefix: &str) -> Option<Stage> {
        let suffix = label.strip_prefix(prefix)?;
        Stage::LABELLED.into_iter().find(|s| s.as_str() == suffix)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manual re-run escape hatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Reimplement,
    Retest,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Reimplement => "reimplement",
            OverrideKind::Retest => "retest",
        }
    }

    /// `<prefix>reimplement` / `<prefix>retest`
    pub fn label(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::None.label("claude-stage-"), None);
        assert_eq!(
            Stage::Implemented.label("claude-stage-").as_deref(),
            Some("claude-stage-implemented")
        );
        assert_eq!(
            Stage::from_label("claude-stage-tested", "claude-stage-"),
            Some(Stage::Tested)
        );
        assert_eq!(Stage::from_label("claude-stage-none", "claude-stage-"), None);
        assert_eq!(Stage::from_label("tested", "claude-stage-"), None);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Tested > Stage::Implemented);
        assert!(Stage::Implemented > Stage::Analyzed);
        assert!(Stage::Analyzed > Stage::None);
    }

    #[test]
    fn test_override_labels() {
        assert_eq!(OverrideKind::Reimplement.label("force-"), "force-reimplement");
        assert_eq!(OverrideKind::Retest.label("rerun-"), "rerun-retest");
    }
}
