//! Transcription service port interface

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::polling::Observation;

/// Transcription service errors
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Transcription job not found: {0}")]
    JobNotFound(String),

    #[error("Transcription request failed: {0}")]
    RequestFailed(String),

    #[error("Transcription service error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse transcription response: {0}")]
    ParseError(String),
}

/// Lifecycle state of a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranscriptionStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// How the bounded poller reads this status
    pub const fn observation(&self) -> Observation {
        match self {
            Self::Completed => Observation::Succeeded,
            Self::Failed => Observation::Failed,
            Self::Queued | Self::InProgress => Observation::Pending,
        }
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of a new transcription job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionJobRequest {
    pub job_name: String,
    pub media_uri: String,
    pub media_format: String,
    pub language_code: String,
    pub output_location: String,
}

/// Port for the managed transcription service
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Start a job; the job name is its handle.
    async fn start(&self, request: &TranscriptionJobRequest) -> Result<String, TranscriptionError>;

    /// Current status of a job.
    async fn describe(&self, job_name: &str) -> Result<TranscriptionStatus, TranscriptionError>;
}
