//! Speech segmentation domain module

mod segmenter;
mod speech_segment;

pub use segmenter::{Segmentation, Segmenter, DEFAULT_SILENCE_THRESHOLD};
pub use speech_segment::SpeechSegment;
