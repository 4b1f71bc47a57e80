//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like FFmpeg, the transcription
//! service, and the local filesystem.

pub mod config;
pub mod ledger;
pub mod queue;
pub mod storage;
pub mod transcoder;
pub mod transcription;

// Re-export adapters
pub use config::XdgConfigStore;
pub use ledger::{FsLedger, InMemoryLedger};
pub use queue::{InMemoryQueue, SpoolQueue};
pub use storage::LocalObjectStore;
pub use transcoder::FfmpegTranscoder;
pub use transcription::HttpTranscriptionService;
