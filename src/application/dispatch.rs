//! Segment dispatch use case

use std::path::Path;

use crate::domain::error::PipelineError;
use crate::domain::job::{path_component, Job, LedgerEntry};
use crate::domain::segment::{Segmentation, Segmenter};
use crate::domain::transcript::Transcript;

use super::ports::{Ledger, MessageQueue};

/// Read and parse a transcript document from disk
pub async fn read_transcript(path: &Path) -> Result<Transcript, PipelineError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        PipelineError::storage(format!("cannot read transcript {}: {}", path.display(), e))
    })?;
    Ok(Transcript::from_json(&content)?)
}

/// Fans segments out into ledger entries and work messages.
///
/// For each segment the ledger entry is written before the message is
/// enqueued, so every delivered message has had a backing entry. The two
/// writes are not transactional; a crash between them leaves an entry
/// without a message, which the ledger poller surfaces as a timeout.
pub struct Dispatcher<L, Q>
where
    L: Ledger,
    Q: MessageQueue,
{
    ledger: L,
    queue: Q,
}

impl<L, Q> Dispatcher<L, Q>
where
    L: Ledger,
    Q: MessageQueue,
{
    pub fn new(ledger: L, queue: Q) -> Self {
        Self { ledger, queue }
    }

    /// Record and enqueue every segment; returns the job with its fixed
    /// segment count.
    pub async fn dispatch(
        &self,
        job_id: &str,
        file_name: &str,
        segmentation: &Segmentation,
    ) -> Result<Job, PipelineError> {
        path_component("job_id", job_id)?;
        path_component("file_name", file_name)?;
        for segment in segmentation.segments() {
            let entry = LedgerEntry::for_segment(job_id, file_name, segment);

            self.ledger.put(&entry).await.map_err(|e| {
                tracing::error!(job_id, index = entry.index, error = %e, "Ledger write failed");
                PipelineError::storage(e.to_string())
            })?;

            self.queue.send(&entry.message()).await.map_err(|e| {
                tracing::error!(job_id, index = entry.index, error = %e, "Enqueue failed");
                PipelineError::storage(e.to_string())
            })?;

            tracing::debug!(
                job_id,
                index = entry.index,
                start_time = %entry.start_time,
                duration = %entry.duration,
                "Dispatched segment"
            );
        }

        let job = Job {
            job_id: job_id.to_string(),
            file_name: file_name.to_string(),
            segment_count: segmentation.count(),
        };
        tracing::info!(job_id, segment_count = job.segment_count, "Dispatch complete");
        Ok(job)
    }

    /// Segment a transcript and dispatch the result
    pub async fn dispatch_transcript(
        &self,
        job_id: &str,
        file_name: &str,
        transcript: &Transcript,
        segmenter: &Segmenter,
    ) -> Result<Job, PipelineError> {
        let segmentation = segmenter.segment(transcript.tokens())?;
        tracing::info!(
            job_id,
            tokens = transcript.len(),
            segments = segmentation.count(),
            threshold = %segmenter.threshold(),
            "Segmented transcript"
        );
        self.dispatch(job_id, file_name, &segmentation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{Delivery, QueueError};
    use crate::domain::error::ErrorKind;
    use crate::domain::job::WorkMessage;
    use crate::domain::transcript::WordToken;
    use crate::infrastructure::ledger::InMemoryLedger;
    use crate::infrastructure::queue::InMemoryQueue;
    use async_trait::async_trait;

    struct RejectingQueue;

    #[async_trait]
    impl MessageQueue for RejectingQueue {
        async fn send(&self, _message: &WorkMessage) -> Result<(), QueueError> {
            Err(QueueError::SendFailed("queue unavailable".to_string()))
        }

        async fn receive(&self, _max: usize) -> Result<Vec<Delivery>, QueueError> {
            Ok(Vec::new())
        }

        async fn ack(&self, _receipt: &str) -> Result<(), QueueError> {
            Ok(())
        }
    }

    fn d(s: &str) -> rust_decimal::Decimal {
        s.parse().unwrap()
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![
            WordToken::pronunciation(d("0.0"), d("1.0")),
            WordToken::pronunciation(d("1.05"), d("2.0")),
            WordToken::punctuation(),
            WordToken::pronunciation(d("3.5"), d("4.0")),
        ])
    }

    #[tokio::test]
    async fn one_entry_and_message_per_segment() {
        let ledger = InMemoryLedger::new();
        let queue = InMemoryQueue::new();
        let dispatcher = Dispatcher::new(ledger.clone(), queue.clone());

        let job = dispatcher
            .dispatch_transcript("job", "talk.mp4", &transcript(), &Segmenter::new(d("0.2")))
            .await
            .unwrap();

        assert_eq!(job.segment_count, 2);
        assert_eq!(ledger.count("job").await.unwrap(), 2);

        let second = ledger.get("job", 1).await.unwrap().unwrap();
        assert_eq!(second.start_time, d("3.5"));
        assert_eq!(second.duration, d("0.5"));
        assert_eq!(second.file_name, "talk.mp4");

        let indices: Vec<u32> = queue.pending().await.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[tokio::test]
    async fn empty_transcript_dispatches_nothing() {
        let ledger = InMemoryLedger::new();
        let queue = InMemoryQueue::new();
        let dispatcher = Dispatcher::new(ledger.clone(), queue.clone());

        let job = dispatcher
            .dispatch_transcript("job", "a.mp4", &Transcript::default(), &Segmenter::default())
            .await
            .unwrap();
        assert_eq!(job.segment_count, 0);
        assert!(ledger.is_empty().await);
        assert!(queue.pending().await.is_empty());
    }

    #[tokio::test]
    async fn enqueue_failure_leaves_entry_without_message() {
        let ledger = InMemoryLedger::new();
        let dispatcher = Dispatcher::new(ledger.clone(), RejectingQueue);

        let err = dispatcher
            .dispatch_transcript("job", "a.mp4", &transcript(), &Segmenter::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Storage);
        // Ledger write precedes the enqueue, so no orphan message exists
        assert_eq!(ledger.count("job").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn escaping_job_id_dispatches_nothing() {
        let ledger = InMemoryLedger::new();
        let queue = InMemoryQueue::new();
        let dispatcher = Dispatcher::new(ledger.clone(), queue.clone());

        let err = dispatcher
            .dispatch_transcript("../job", "a.mp4", &transcript(), &Segmenter::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(ledger.is_empty().await);
        assert!(queue.pending().await.is_empty());
    }

    #[tokio::test]
    async fn untimed_word_is_invalid_transcript() {
        let dispatcher = Dispatcher::new(InMemoryLedger::new(), InMemoryQueue::new());
        let broken = Transcript::new(vec![WordToken {
            end_time: None,
            ..WordToken::pronunciation(d("0"), d("1"))
        }]);
        let err = dispatcher
            .dispatch_transcript("job", "a.mp4", &broken, &Segmenter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTranscript);
    }

    #[tokio::test]
    async fn read_transcript_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcription.json");
        std::fs::write(
            &path,
            r#"{"results": {"items": [{"type": "pronunciation", "start_time": "0.1", "end_time": "0.4"}]}}"#,
        )
        .unwrap();

        let transcript = read_transcript(&path).await.unwrap();
        assert_eq!(transcript.len(), 1);

        let err = read_transcript(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
