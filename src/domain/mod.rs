//! Domain layer - Core business logic
//!
//! Contains value objects, the segmentation algorithm, the polling state
//! machine and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod job;
pub mod polling;
pub mod segment;
pub mod transcript;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use job::{Job, JobWorkspace, LedgerEntry, StepEvent, WorkMessage};
pub use polling::{Observation, PollState, DEFAULT_MAX_POLL_COUNT};
pub use segment::{Segmentation, Segmenter, SpeechSegment};
pub use transcript::{TokenKind, Transcript, WordToken};
