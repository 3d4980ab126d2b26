//! Artifact persistence
//!
//! Stores return the path a client downloads the artifact from, relative to
//! the store root and always `/`-separated.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::package::{Artifact, ArtifactKind, SUFFIX_LENGTH};
use crate::utils::naming::{create_artifact_stem, format_file_name, random_suffix};

/// Persists artifacts and reports where they can be fetched
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store the artifact and return its relative path
    async fn store(&self, artifact: &Artifact) -> Result<String>;
}

/// Writes artifacts below a local output directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    prefix: String,
}

impl DirectoryStore {
    pub fn new(root: impl AsRef<Path>, prefix: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative location for an artifact.
    ///
    /// Zip archives already carry a unique name. Single files keep their
    /// unit name, so they go into a uniquely named directory.
    fn relative_path(&self, artifact: &Artifact) -> String {
        let file_name = format_file_name(&artifact.file_name);
        match artifact.kind {
            ArtifactKind::Zip => file_name,
            ArtifactKind::SingleFile => {
                let stem = create_artifact_stem(&self.prefix, Utc::now(), &random_suffix(SUFFIX_LENGTH));
                format!("{}/{}", stem, file_name)
            }
        }
    }
}

#[async_trait]
impl ArtifactStore for DirectoryStore {
    async fn store(&self, artifact: &Artifact) -> Result<String> {
        let relative = self.relative_path(artifact);
        let path = relative
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::File::create(&path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&artifact.content).await?;
        writer.flush().await?;

        tracing::info!(path = %path.display(), bytes = artifact.content.len(), "Stored artifact");
        Ok(relative)
    }
}

/// Keeps artifacts in memory; used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: RwLock<Vec<(String, Artifact)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored artifacts with their relative paths, in storing order
    pub async fn artifacts(&self) -> Vec<(String, Artifact)> {
        self.artifacts.read().await.clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn store(&self, artifact: &Artifact) -> Result<String> {
        let path = artifact.file_name.clone();
        self.artifacts.write().await.push((path.clone(), artifact.clone()));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, kind: ArtifactKind) -> Artifact {
        Artifact {
            file_name: name.to_string(),
            content: b"content".to_vec(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_single_file_goes_into_unique_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path(), "codegen");

        let first = store.store(&artifact("users.go", ArtifactKind::SingleFile)).await.unwrap();
        let second = store.store(&artifact("users.go", ArtifactKind::SingleFile)).await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("codegen-"));
        assert!(first.ends_with("/users.go"));
        let written = std::fs::read(dir.path().join(&first)).unwrap();
        assert_eq!(written, b"content");
    }

    #[tokio::test]
    async fn test_zip_is_stored_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("nested"), "codegen");

        let path = store
            .store(&artifact("codegen-20240101-000000-abc.zip", ArtifactKind::Zip))
            .await
            .unwrap();

        assert_eq!(path, "codegen-20240101-000000-abc.zip");
        assert!(dir.path().join("nested").join(&path).exists());
    }

    #[tokio::test]
    async fn test_memory_store_keeps_order() {
        let store = MemoryStore::new();
        store.store(&artifact("a.rs", ArtifactKind::SingleFile)).await.unwrap();
        store.store(&artifact("b.zip", ArtifactKind::Zip)).await.unwrap();

        let names: Vec<_> = store.artifacts().await.into_iter().map(|(path, _)| path).collect();
        assert_eq!(names, vec!["a.rs", "b.zip"]);
    }
}
