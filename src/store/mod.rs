//! Artifact persistence keyed by original issue key, then phase
//!
//! Bundles are written wholesale: writing a phase replaces whatever was stored
//! for it before.

mod bundle;
mod fs;
mod memory;

pub use bundle::{
    evaluation_files, implementation_files, load_implementation, primary_file_name,
    EVALUATION_JSON, EVALUATION_REPORT, IMPLEMENTATION_JSON, IMPLEMENTATION_SUMMARY,
};
pub use fs::FsArtifactStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// File name → content
pub type FileMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Implementation,
    Evaluation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Implementation => "implementation",
            Phase::Evaluation => "evaluation",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn write_files(
        &self,
        issue_key: &str,
        phase: Phase,
        files: &FileMap,
    ) -> Result<(), StoreError>;

    async fn read_files(&self, issue_key: &str, phase: Phase) -> Result<FileMap, StoreError>;
}

/// Reject path components that could escape the artifact root
pub(crate) fn validate_component(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name.split(['/', '\\']).any(|part| part == "..")
        || name.starts_with('/')
        || name.starts_with('\\')
        || name.contains('\0');
    if invalid {
        return Err(StoreError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_component() {
        assert!(validate_component("PCP1-67").is_ok());
        assert!(validate_component("src/main.rs").is_ok());
        assert!(validate_component("notes..v2.md").is_ok());
        assert!(validate_component("../etc/passwd").is_err());
        assert!(validate_component("docs/../../etc").is_err());
        assert!(validate_component("docs\\..\\secret").is_err());
        assert!(validate_component("/absolute").is_err());
        assert!(validate_component("").is_err());
    }
}
