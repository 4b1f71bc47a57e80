//! Units of fan-out work

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::segment::SpeechSegment;

/// "Segment `index` of job `job_id` is not yet clipped."
///
/// Written by the dispatcher, removed by the clip worker after a
/// successful clip, never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub job_id: String,
    pub index: u32,
    pub file_name: String,
    pub start_time: Decimal,
    pub duration: Decimal,
}

impl LedgerEntry {
    pub fn for_segment(job_id: &str, file_name: &str, segment: &SpeechSegment) -> Self {
        Self {
            job_id: job_id.to_string(),
            index: segment.index,
            file_name: file_name.to_string(),
            start_time: segment.start_time,
            duration: segment.duration,
        }
    }

    pub fn message(&self) -> WorkMessage {
        WorkMessage {
            job_id: self.job_id.clone(),
            index: self.index,
        }
    }
}

/// Queue payload pointing at one ledger entry.
///
/// Delivered at least once, possibly duplicated or out of order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkMessage {
    #[serde(alias = "job_name")]
    pub job_id: String,
    pub index: u32,
}
