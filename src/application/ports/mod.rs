//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod ledger;
pub mod object_store;
pub mod queue;
pub mod transcoder;
pub mod transcription;

// Re-export common types
pub use config::ConfigStore;
pub use ledger::{Ledger, LedgerError};
pub use object_store::{ObjectStore, StorageError};
pub use queue::{Delivery, MessageQueue, QueueError};
pub use transcoder::{MediaTranscoder, TranscodeError};
pub use transcription::{
    TranscriptionError, TranscriptionJobRequest, TranscriptionService, TranscriptionStatus,
};
