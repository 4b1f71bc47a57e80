//! Application layer - Use cases and port interfaces
//!
//! Contains the pipeline steps and the trait definitions
//! for external system interactions.

pub mod clip;
pub mod concat;
pub mod dispatch;
pub mod poller;
pub mod ports;
pub mod transcribe;
pub mod transfer;

// Re-export use cases
pub use clip::{ClipOutcome, ClipWorker, DrainReport};
pub use concat::Concatenator;
pub use dispatch::{read_transcript, Dispatcher};
pub use poller::{BoundedPoller, LedgerDrainProbe, Probe, TranscriptionJobProbe};
pub use transcribe::{new_job_id, start_jobs, TranscriptionSettings, TranscriptionStarter};
pub use transfer::{transcript_key, Buckets, WorkspaceTransfer};
