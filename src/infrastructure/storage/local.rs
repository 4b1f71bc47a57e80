//! Directory-backed object store adapter

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{ObjectStore, StorageError};

/// Buckets are directories under `root`, keys are file names within them
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        for part in [bucket, key] {
            if part.is_empty() || part.split(['/', '\\']).any(|c| c == ".." || c.is_empty()) {
                return Err(StorageError::TransferFailed(format!(
                    "invalid object name: {}/{}",
                    bucket, key
                )));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::TransferFailed(format!("{}: {}", parent.display(), e)))?;
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StorageError> {
        let src = self.object_path(bucket, key)?;
        ensure_parent(dest).await?;
        match fs::copy(&src, dest).await {
            Ok(bytes) => {
                tracing::debug!(bucket, key, bytes, dest = %dest.display(), "Fetched object");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !src.exists() => {
                Err(StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(StorageError::TransferFailed(e.to_string())),
        }
    }

    async fn put(&self, bucket: &str, key: &str, src: &Path) -> Result<(), StorageError> {
        let dest = self.object_path(bucket, key)?;
        ensure_parent(&dest).await?;
        let bytes = fs::copy(src, &dest)
            .await
            .map_err(|e| StorageError::TransferFailed(format!("{}: {}", src.display(), e)))?;
        tracing::debug!(bucket, key, bytes, "Stored object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::TransferFailed(e.to_string())),
        }
    }

    fn uri(&self, bucket: &str, key: &str) -> String {
        format!("file://{}", self.root.join(bucket).join(key).display())
    }
}
