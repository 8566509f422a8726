use super::{validate_component, ArtifactStore, FileMap, Phase};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Artifact store held in memory; can be told to fail writes
#[derive(Default)]
pub struct MemoryStore {
    bundles: Mutex<BTreeMap<(String, Phase), FileMap>>,
    fail_writes: Mutex<Option<Phase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bundles(&self) -> MutexGuard<'_, BTreeMap<(String, Phase), FileMap>> {
        self.bundles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail every write of `phase` with an I/O error
    pub fn fail_writes(&self, phase: Phase) {
        *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) = Some(phase);
    }

    pub fn bundle(&self, issue_key: &str, phase: Phase) -> Option<FileMap> {
        self.bundles().get(&(issue_key.to_string(), phase)).cloned()
    }

    /// Seed a bundle directly
    pub fn put(&self, issue_key: &str, phase: Phase, files: FileMap) {
        self.bundles().insert((issue_key.to_string(), phase), files);
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn write_files(
        &self,
        issue_key: &str,
        phase: Phase,
        files: &FileMap,
    ) -> Result<(), StoreError> {
        validate_component(issue_key)?;
        for name in files.keys() {
            validate_component(name)?;
        }
        let failing = *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner());
        if failing == Some(phase) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("injected {} write failure", phase),
            )));
        }
        self.bundles()
            .insert((issue_key.to_string(), phase), files.clone());
        Ok(())
    }

    async fn read_files(&self, issue_key: &str, phase: Phase) -> Result<FileMap, StoreError> {
        self.bundle(issue_key, phase)
            .ok_or_else(|| StoreError::NotFound {
                issue_key: issue_key.to_string(),
                phase: phase.to_string(),
            })
    }
}
