//! Domain error types

use std::fmt;

use thiserror::Error;

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when a transcript document cannot be used for segmentation
#[derive(Debug, Clone, Error)]
pub enum TranscriptError {
    #[error("Failed to parse transcript: {0}")]
    ParseError(String),

    #[error("Pronunciation item at position {position} has no start_time/end_time")]
    MissingTiming { position: usize },
}

/// Category of a pipeline failure.
///
/// Callers branch on the kind to decide remediation: a `ClipExecution`
/// failure is retried through message redelivery, `ExternalObservation`
/// can be retried with the same poll state, everything else is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid job/file identifiers or settings
    Configuration,
    /// A status probe could not be completed
    ExternalObservation,
    /// Any other call to an external service failed
    ExternalService,
    /// One segment failed to transcode
    ClipExecution,
    /// Reassembly of the clips failed
    ConcatExecution,
    /// The bounded poller exhausted its observations
    Timeout,
    /// Ledger, queue or object store write failed
    Storage,
    /// The transcript document is malformed
    InvalidTranscript,
}

impl ErrorKind {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::ExternalObservation => "ExternalObservationError",
            Self::ExternalService => "ExternalServiceError",
            Self::ClipExecution => "ClipExecutionError",
            Self::ConcatExecution => "ConcatExecutionError",
            Self::Timeout => "TimeoutError",
            Self::Storage => "StorageError",
            Self::InvalidTranscript => "InvalidTranscriptError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged error returned by every pipeline step
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn observation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalObservation, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    pub fn clip(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClipExecution, message)
    }

    pub fn concat(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcatExecution, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<TranscriptError> for PipelineError {
    fn from(err: TranscriptError) -> Self {
        Self::new(ErrorKind::InvalidTranscript, err.to_string())
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
