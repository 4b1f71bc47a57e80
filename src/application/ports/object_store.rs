//! Object store port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Object store errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object transfer failed: {0}")]
    TransferFailed(String),
}

/// Port for bucket/key object transfer
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy `bucket/key` to the local file `dest`.
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StorageError>;

    /// Copy the local file `src` to `bucket/key`.
    async fn put(&self, bucket: &str, key: &str, src: &Path) -> Result<(), StorageError>;

    /// Remove `bucket/key`. Removing an absent object succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Location of `bucket/key` as seen by other services.
    fn uri(&self, bucket: &str, key: &str) -> String;
}
