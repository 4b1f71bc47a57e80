//! Job identity and the step event threaded between invocations

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;
use crate::domain::polling::PollState;

use super::workspace::path_component;

/// A job after dispatch.
///
/// `segment_count` is fixed by the dispatcher and carried unchanged to
/// the concatenator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub file_name: String,
    pub segment_count: u32,
}

/// Payload the scheduler passes from one step to the next.
///
/// Every field is optional on the wire; a step asks for the fields it
/// needs and fails with a configuration error when one is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    #[serde(alias = "job_name", default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(alias = "file_count", default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
    #[serde(alias = "iterator", default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollState>,
}

impl StepEvent {
    /// Event that opens a new job
    pub fn start(job_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            file_name: Some(file_name.into()),
            segment_count: None,
            poll: Some(PollState::initial()),
        }
    }

    pub fn require_job_id(&self) -> Result<&str, PipelineError> {
        path_component("job_id", non_empty(self.job_id.as_deref(), "job_id")?)
    }

    pub fn require_file_name(&self) -> Result<&str, PipelineError> {
        path_component("file_name", non_empty(self.file_name.as_deref(), "file_name")?)
    }

    pub fn require_segment_count(&self) -> Result<u32, PipelineError> {
        self.segment_count
            .ok_or_else(|| PipelineError::configuration("missing segment_count"))
    }

    /// Poll state to resume from; absent means a fresh wait
    pub fn poll_state(&self) -> PollState {
        self.poll.unwrap_or_default()
    }

    /// The dispatched job this event describes
    pub fn job(&self) -> Result<Job, PipelineError> {
        Ok(Job {
            job_id: self.require_job_id()?.to_string(),
            file_name: self.require_file_name()?.to_string(),
            segment_count: self.require_segment_count()?,
        })
    }

    pub fn with_poll(self, poll: PollState) -> Self {
        Self {
            poll: Some(poll),
            ..self
        }
    }

    pub fn with_segment_count(self, segment_count: u32) -> Self {
        Self {
            segment_count: Some(segment_count),
            ..self
        }
    }

    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(content)
            .map_err(|e| PipelineError::configuration(format!("invalid step event: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        serde_json::to_string(self)
            .map_err(|e| PipelineError::configuration(format!("cannot encode step event: {}", e)))
    }
}

fn non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, PipelineError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PipelineError::configuration(format!("missing {}", field))),
    }
}
