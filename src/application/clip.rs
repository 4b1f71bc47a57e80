//! Clip worker use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::domain::error::PipelineError;
use crate::domain::job::{path_component, JobWorkspace, WorkMessage};

use super::ports::{Delivery, Ledger, MediaTranscoder, MessageQueue};

/// Result of handling one work message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The segment was cut and its ledger entry removed
    Clipped { output: PathBuf },
    /// No ledger entry: already done, or a message without backing record
    AlreadyDone,
}

/// Summary of one queue drain
#[derive(Debug, Default)]
pub struct DrainReport {
    pub clipped: usize,
    pub skipped: usize,
    pub failed: Vec<(Option<WorkMessage>, PipelineError)>,
}

impl DrainReport {
    pub fn received(&self) -> usize {
        self.clipped + self.skipped + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cuts one segment per work message.
///
/// Safe under duplicate and concurrent delivery: the ledger lookup turns a
/// finished segment into a no-op, and the entry is only deleted after the
/// clip succeeded, so a crash mid-clip leaves the work to be retried.
/// Each attempt transcodes into its own staging file and renames it over
/// the final clip, so a late duplicate never exposes a partial clip.
pub struct ClipWorker<L, T>
where
    L: Ledger,
    T: MediaTranscoder,
{
    ledger: L,
    transcoder: T,
    workspace_root: PathBuf,
    clip_extension: String,
}

impl<L, T> ClipWorker<L, T>
where
    L: Ledger,
    T: MediaTranscoder,
{
    pub fn new(
        ledger: L,
        transcoder: T,
        workspace_root: impl Into<PathBuf>,
        clip_extension: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            transcoder,
            workspace_root: workspace_root.into(),
            clip_extension: clip_extension.into(),
        }
    }

    fn workspace(&self, job_id: &str) -> JobWorkspace {
        JobWorkspace::new(&self.workspace_root, job_id, self.clip_extension.as_str())
    }

    /// Handle one work message.
    pub async fn process(&self, message: &WorkMessage) -> Result<ClipOutcome, PipelineError> {
        let WorkMessage { job_id, index } = message;
        let index = *index;
        path_component("job_id", job_id)?;

        let entry = self.ledger.get(job_id, index).await.map_err(|e| {
            tracing::error!(%job_id, index, error = %e, "Ledger lookup failed");
            PipelineError::storage(e.to_string())
        })?;

        let Some(entry) = entry else {
            tracing::info!(%job_id, index, "No ledger entry, skipping");
            return Ok(ClipOutcome::AlreadyDone);
        };

        let workspace = self.workspace(job_id);
        let input = workspace.source_path(path_component("file_name", &entry.file_name)?);
        let output = workspace.clip_path(index);
        let tag = uuid::Uuid::new_v4().simple().to_string();
        let staging = workspace.staging_clip_path(index, &tag);
        ensure_dir(&workspace.clipped_dir()).await?;

        tracing::info!(
            %job_id,
            index,
            start_time = %entry.start_time,
            duration = %entry.duration,
            "Clipping segment"
        );

        if let Err(e) = self
            .transcoder
            .clip(entry.start_time, entry.duration, &input, &staging)
            .await
        {
            tracing::error!(%job_id, index, error = %e, "Clip failed");
            discard(&staging).await;
            return Err(PipelineError::clip(format!(
                "segment {} of job {}: {}",
                index, job_id, e
            )));
        }

        if let Err(e) = tokio::fs::rename(&staging, &output).await {
            tracing::error!(%job_id, index, error = %e, "Clip move failed");
            discard(&staging).await;
            return Err(PipelineError::clip(format!(
                "cannot move clip into {}: {}",
                output.display(),
                e
            )));
        }

        self.ledger.delete(job_id, index).await.map_err(|e| {
            tracing::error!(%job_id, index, error = %e, "Ledger delete failed");
            PipelineError::storage(e.to_string())
        })?;

        tracing::info!(%job_id, index, output = %output.display(), "Segment clipped");
        Ok(ClipOutcome::Clipped { output })
    }

    /// Handle a queue delivery and acknowledge it on success.
    /// A failed unit stays unacknowledged so the queue redelivers it.
    pub async fn process_delivery<Q: MessageQueue + ?Sized>(
        &self,
        queue: &Q,
        delivery: &Delivery,
    ) -> Result<ClipOutcome, PipelineError> {
        let outcome = self.process(&delivery.message).await?;
        acknowledge(queue, delivery).await?;
        Ok(outcome)
    }
}

impl<L, T> ClipWorker<L, T>
where
    L: Ledger + 'static,
    T: MediaTranscoder + 'static,
{
    /// Receive up to `batch` messages and process them concurrently.
    ///
    /// Successful units are acknowledged; failures are reported and left
    /// in the queue for redelivery.
    pub async fn drain<Q: MessageQueue + ?Sized>(
        self: Arc<Self>,
        queue: &Q,
        batch: usize,
    ) -> Result<DrainReport, PipelineError> {
        let deliveries = queue.receive(batch).await.map_err(|e| {
            tracing::error!(error = %e, "Queue receive failed");
            PipelineError::storage(e.to_string())
        })?;
        tracing::info!(received = deliveries.len(), "Received work messages");

        let mut tasks = JoinSet::new();
        for delivery in deliveries {
            let worker = Arc::clone(&self);
            tasks.spawn(async move {
                let result = worker.process(&delivery.message).await;
                (delivery, result)
            });
        }

        let mut report = DrainReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (delivery, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(error = %e, "Clip task aborted");
                    report
                        .failed
                        .push((None, PipelineError::clip(format!("clip task aborted: {}", e))));
                    continue;
                }
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    report.failed.push((Some(delivery.message), err));
                    continue;
                }
            };

            if let Err(err) = acknowledge(queue, &delivery).await {
                report.failed.push((Some(delivery.message), err));
                continue;
            }

            match outcome {
                ClipOutcome::Clipped { .. } => report.clipped += 1,
                ClipOutcome::AlreadyDone => report.skipped += 1,
            }
        }

        tracing::info!(
            clipped = report.clipped,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Drain finished"
        );
        Ok(report)
    }
}

async fn acknowledge<Q: MessageQueue + ?Sized>(
    queue: &Q,
    delivery: &Delivery,
) -> Result<(), PipelineError> {
    queue.ack(&delivery.receipt).await.map_err(|e| {
        tracing::error!(
            job_id = %delivery.message.job_id,
            index = delivery.message.index,
            error = %e,
            "Acknowledge failed"
        );
        PipelineError::storage(e.to_string())
    })
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Could not remove staging clip");
        }
    }
}

async fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::clip(format!("cannot create {}: {}", dir.display(), e)))
}
