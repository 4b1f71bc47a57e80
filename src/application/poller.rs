//! Bounded poller use case
//!
//! One transition, two probes: the same [`BoundedPoller`] watches the
//! transcription job and the clip ledger. The poller never sleeps; the
//! caller invokes it again after its own delay with the returned state.

use async_trait::async_trait;

use crate::domain::error::PipelineError;
use crate::domain::polling::{Observation, PollState, DEFAULT_MAX_POLL_COUNT};

use super::ports::{Ledger, TranscriptionService};

/// A capability that looks at some long-running work once
#[async_trait]
pub trait Probe: Send + Sync {
    async fn observe(&self) -> Result<Observation, PipelineError>;
}

/// Observes the status of a transcription job
pub struct TranscriptionJobProbe<'a, S: ?Sized> {
    service: &'a S,
    job_name: &'a str,
}

impl<'a, S: TranscriptionService + ?Sized> TranscriptionJobProbe<'a, S> {
    pub fn new(service: &'a S, job_name: &'a str) -> Self {
        Self { service, job_name }
    }
}

#[async_trait]
impl<'a, S: TranscriptionService + ?Sized> Probe for TranscriptionJobProbe<'a, S> {
    async fn observe(&self) -> Result<Observation, PipelineError> {
        let status = self.service.describe(self.job_name).await.map_err(|e| {
            tracing::error!(job_id = %self.job_name, error = %e, "Transcription status query failed");
            PipelineError::observation(e.to_string())
        })?;
        tracing::info!(job_id = %self.job_name, %status, "Transcription job status");
        Ok(status.observation())
    }
}

/// Observes whether a job's clip ledger has drained
pub struct LedgerDrainProbe<'a, L: ?Sized> {
    ledger: &'a L,
    job_id: &'a str,
}

impl<'a, L: Ledger + ?Sized> LedgerDrainProbe<'a, L> {
    pub fn new(ledger: &'a L, job_id: &'a str) -> Self {
        Self { ledger, job_id }
    }
}

#[async_trait]
impl<'a, L: Ledger + ?Sized> Probe for LedgerDrainProbe<'a, L> {
    async fn observe(&self) -> Result<Observation, PipelineError> {
        let remaining = self.ledger.count(self.job_id).await.map_err(|e| {
            tracing::error!(job_id = %self.job_id, error = %e, "Ledger query failed");
            PipelineError::observation(e.to_string())
        })?;
        tracing::info!(job_id = %self.job_id, remaining, "Outstanding clip entries");
        Ok(if remaining == 0 {
            Observation::Succeeded
        } else {
            Observation::Pending
        })
    }
}

/// Advances a [`PollState`] by one observation, capped at `max_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoller {
    max_count: u32,
}

impl BoundedPoller {
    pub fn new(max_count: u32) -> Self {
        Self { max_count }
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Pure transition for an observation made elsewhere
    pub fn next(&self, prev: PollState, observation: Observation) -> PollState {
        prev.next(observation, self.max_count)
    }

    /// Observe once through `probe` and return the following state.
    ///
    /// A failed observation returns the error and no state: the caller
    /// retries with the same `prev`, so the index only advances after a
    /// completed observation.
    pub async fn poll<P: Probe + ?Sized>(
        &self,
        probe: &P,
        prev: PollState,
    ) -> Result<PollState, PipelineError> {
        let observation = probe.observe().await?;
        let next = self.next(prev, observation);

        if next.timed_out {
            tracing::warn!(
                index = next.index,
                max_count = self.max_count,
                %observation,
                "Polling gave up"
            );
        } else {
            tracing::debug!(
                index = next.index,
                should_continue = next.should_continue,
                %observation,
                "Poll transition"
            );
        }
        Ok(next)
    }

    /// Turn a timed-out state into a `Timeout` error
    pub fn check_timeout(&self, state: PollState) -> Result<PollState, PipelineError> {
        if state.timed_out {
            Err(PipelineError::timeout(format!(
                "gave up after {} observations (limit {})",
                state.index, self.max_count
            )))
        } else {
            Ok(state)
        }
    }
}

impl Default for BoundedPoller {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POLL_COUNT)
    }
}
