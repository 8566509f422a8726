use super::{validate_component, ArtifactStore, FileMap, Phase};
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Stores bundles as `<root>/<ISSUE-KEY>/<phase>/<file>`
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn phase_dir(&self, issue_key: &str, phase: Phase) -> Result<PathBuf, StoreError> {
        validate_component(issue_key)?;
        if issue_key.contains('/') || issue_key.contains('\\') {
            return Err(StoreError::InvalidName {
                name: issue_key.to_string(),
            });
        }
        Ok(self.root.join(issue_key).join(phase.as_str()))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write_files(
        &self,
        issue_key: &str,
        phase: Phase,
        files: &FileMap,
    ) -> Result<(), StoreError> {
        let phase_dir = self.phase_dir(issue_key, phase)?;
        for name in files.keys() {
            validate_component(name)?;
        }

        let parent = phase_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        std::fs::create_dir_all(&parent)?;

        // Stage the bundle next to the old one, then swap it in
        let staging = parent.join(format!(".{}-{}", phase.as_str(), uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&staging)?;
        let staged = (|| -> Result<(), StoreError> {
            for (name, content) in files {
                let path = staging.join(name);
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                std::fs::write(&path, content)?;
            }
            Ok(())
        })();
        if let Err(e) = staged {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        if phase_dir.exists() {
            std::fs::remove_dir_all(&phase_dir)?;
        }
        std::fs::rename(&staging, &phase_dir)?;

        debug!(
            issue_key,
            phase = phase.as_str(),
            files = files.len(),
            dir = %phase_dir.display(),
            "Wrote artifact bundle"
        );
        Ok(())
    }

    async fn read_files(&self, issue_key: &str, phase: Phase) -> Result<FileMap, StoreError> {
        let phase_dir = self.phase_dir(issue_key, phase)?;
        if !phase_dir.is_dir() {
            return Err(StoreError::NotFound {
                issue_key: issue_key.to_string(),
                phase: phase.to_string(),
            });
        }

        let mut files = FileMap::new();
        for entry in WalkDir::new(&phase_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let Ok(rel_path) = entry.path().strip_prefix(&phase_dir) else {
                continue;
            };
            let name = rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            let content = std::fs::read_to_string(entry.path()).map_err(|e| StoreError::Decode {
                file: name.clone(),
                message: e.to_string(),
            })?;
            files.insert(name, content);
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundle(entries: &[(&str, &str)]) -> FileMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_write_then_read_nested_files() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let files = bundle(&[("main.py", "print('hi')"), ("tests/test_main.py", "assert True")]);
        store
            .write_files("PCP1-67", Phase::Implementation, &files)
            .await
            .unwrap();

        assert!(dir.path().join("PCP1-67/implementation/tests/test_main.py").exists());
        let read = store.read_files("PCP1-67", Phase::Implementation).await.unwrap();
        assert_eq!(read, files);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_bundle() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store
            .write_files("ABC-1", Phase::Implementation, &bundle(&[("old.md", "v1")]))
            .await
            .unwrap();
        store
            .write_files("ABC-1", Phase::Implementation, &bundle(&[("new.md", "v2")]))
            .await
            .unwrap();

        let read = store.read_files("ABC-1", Phase::Implementation).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read.get("new.md").map(String::as_str), Some("v2"));
    }

    #[tokio::test]
    async fn test_missing_bundle_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store.read_files("ABC-1", Phase::Evaluation).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let err = store
            .write_files("../escape", Phase::Implementation, &FileMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName { .. }));

        let err = store
            .write_files("ABC-1", Phase::Implementation, &bundle(&[("../x.md", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName { .. }));
    }

    #[tokio::test]
    async fn test_double_dot_inside_a_name_is_allowed() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store
            .write_files("ABC-1", Phase::Implementation, &bundle(&[("notes..v2.md", "n")]))
            .await
            .unwrap();
        let read = store.read_files("ABC-1", Phase::Implementation).await.unwrap();
        assert_eq!(read.get("notes..v2.md").map(String::as_str), Some("n"));
    }
}
