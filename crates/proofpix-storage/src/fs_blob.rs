//! Filesystem [`BlobStore`].
//!
//! A blob at `a/b/c.png` lives at `{root}/a/b/c.png`. Writes go to a
//! uniquely named temp file in the same directory and are renamed into
//! place, so readers never observe a partially written object.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use proofpix_core::traits::BlobStore;
use proofpix_core::CoreResult;

use crate::error::{StorageError, StorageResult};

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the store root, creating it if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| StorageError::OpenFailed {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob path to a file path under the root.
    ///
    /// Only plain relative segments are accepted.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn read(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        let file = self.resolve(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("{}: {}", path, e))),
        }
    }

    async fn write(&self, path: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let file = self.resolve(path)?;
        let parent = file
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", path, e)))?;

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed(format!("{}: {}", path, e)));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &file).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed(format!("{}: {}", path, e)));
        }

        debug!(path, bytes = bytes.len(), "blob written");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, path: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.read(path).await?)
    }

    async fn put(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> CoreResult<()> {
        Ok(self.write(path, bytes).await?)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
