//! Media transcoder adapters

mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;
