//! Speech segment value object

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A contiguous interval of speech inside the source recording.
///
/// Created only by the segmenter: `duration` is strictly positive and
/// indices of one job are contiguous from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub index: u32,
    pub start_time: Decimal,
    pub duration: Decimal,
}

impl SpeechSegment {
    pub fn end_time(&self) -> Decimal {
        self.start_time + self.duration
    }
}
