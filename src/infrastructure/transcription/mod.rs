//! Transcription service adapters

mod http;

pub use http::HttpTranscriptionService;
