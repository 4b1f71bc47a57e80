//! SpeechCut - silence-cutting media pipeline
//!
//! Transcribes a recording, splits it into speech segments wherever the
//! silence between words exceeds a threshold, clips every segment in
//! parallel, and joins the clips back into one file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Segmentation, the bounded polling state machine, job values and errors
//! - **Application**: Pipeline steps and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (FFmpeg, HTTP transcription, filesystem ledger/queue/store)
//! - **CLI**: One subcommand per pipeline step, config management and logging setup

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
