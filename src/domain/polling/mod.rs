//! Bounded polling state machine
//!
//! Waiting on long-running external work is modeled as a pure transition
//! that an outside scheduler invokes repeatedly, sleeping between calls.
//! All progress lives in [`PollState`], which is handed back to the caller
//! after every observation.
//!
//! Transitions:
//!   observation succeeded            -> { index: 0,   continue: false, timed_out: false }
//!   index + 1 > max_count or failed  -> { index: i+1, continue: false, timed_out: true  }
//!   otherwise                        -> { index: i+1, continue: true,  timed_out: false }

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of observations before giving up
pub const DEFAULT_MAX_POLL_COUNT: u32 = 200;

/// What a probe saw on one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    /// The awaited work finished
    Succeeded,
    /// Still running; observe again later
    Pending,
    /// The awaited work failed and will never succeed
    Failed,
}

impl Observation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Externalized continuation of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PollState {
    #[serde(default)]
    pub index: u32,
    #[serde(rename = "continue", alias = "is_continue", default)]
    pub should_continue: bool,
    #[serde(alias = "is_timeout", default)]
    pub timed_out: bool,
}

impl PollState {
    /// State handed to the first observation
    pub const fn initial() -> Self {
        Self {
            index: 0,
            should_continue: false,
            timed_out: false,
        }
    }

    /// Compute the state following `observation`.
    pub fn next(self, observation: Observation, max_count: u32) -> Self {
        let index = self.index.saturating_add(1);
        match observation {
            Observation::Succeeded => Self {
                index: 0,
                should_continue: false,
                timed_out: false,
            },
            Observation::Failed => Self {
                index,
                should_continue: false,
                timed_out: true,
            },
            Observation::Pending if index > max_count => Self {
                index,
                should_continue: false,
                timed_out: true,
            },
            Observation::Pending => Self {
                index,
                should_continue: true,
                timed_out: false,
            },
        }
    }

    /// Terminal states need no further observation
    pub fn is_finished(&self) -> bool {
        !self.should_continue
    }

    /// Finished without a timeout, i.e. the awaited work succeeded
    pub fn is_success(&self) -> bool {
        !self.should_continue && !self.timed_out
    }
}
