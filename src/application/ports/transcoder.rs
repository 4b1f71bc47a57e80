//! Media transcoder port interface

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Transcoder errors
#[derive(Debug, Clone, Error)]
pub enum TranscodeError {
    #[error("Transcoder binary not found: {0}")]
    NotFound(String),

    #[error("Failed to start transcoder: {0}")]
    StartFailed(String),

    #[error("Transcoder exited with status {status}: {message}")]
    Failed { status: i32, message: String },

    #[error("Transcoder I/O failed: {0}")]
    Io(String),
}

/// Port for the external clip/concat process
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Cut `duration` seconds starting at `start` out of `input`.
    async fn clip(
        &self,
        start: Decimal,
        duration: Decimal,
        input: &Path,
        output: &Path,
    ) -> Result<(), TranscodeError>;

    /// Join `inputs` in order into `output`.
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), TranscodeError>;
}
