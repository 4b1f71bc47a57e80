//! Job start and transcription start use cases

use crate::domain::error::PipelineError;
use crate::domain::job::StepEvent;

use super::ports::{ObjectStore, TranscriptionJobRequest, TranscriptionService};

/// Mint a fresh job identifier
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Opening step events, one new job per source file
pub fn start_jobs<I, S>(file_names: I) -> Result<Vec<StepEvent>, PipelineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    file_names
        .into_iter()
        .map(|name| {
            let event = StepEvent::start(new_job_id(), name.as_ref());
            // rejects blank names before anything is started
            event.require_file_name()?;
            tracing::info!(job_id = ?event.job_id, file_name = name.as_ref(), "Job created");
            Ok(event)
        })
        .collect()
}

/// Settings for new transcription jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionSettings {
    /// Bucket holding the uploaded source media
    pub input_bucket: String,
    /// Bucket the service writes `<job_id>.json` into
    pub output_bucket: String,
    /// Container format of the source, e.g. `mp4`
    pub media_format: String,
    /// Spoken language, e.g. `ja-JP`
    pub language_code: String,
}

/// Starts the transcription job for a freshly started pipeline job
pub struct TranscriptionStarter<'a, S: ?Sized, O: ?Sized> {
    service: &'a S,
    store: &'a O,
    settings: TranscriptionSettings,
}

impl<'a, S, O> TranscriptionStarter<'a, S, O>
where
    S: TranscriptionService + ?Sized,
    O: ObjectStore + ?Sized,
{
    pub fn new(service: &'a S, store: &'a O, settings: TranscriptionSettings) -> Self {
        Self {
            service,
            store,
            settings,
        }
    }

    /// Request a transcription job named after `job_id`
    pub fn request(&self, job_id: &str, file_name: &str) -> TranscriptionJobRequest {
        TranscriptionJobRequest {
            job_name: job_id.to_string(),
            media_uri: self.store.uri(&self.settings.input_bucket, file_name),
            media_format: self.settings.media_format.clone(),
            language_code: self.settings.language_code.clone(),
            output_location: self.settings.output_bucket.clone(),
        }
    }

    /// Start transcription for the job in `event`; the event passes
    /// through unchanged.
    pub async fn start(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let file_name = event.require_file_name()?;
        let request = self.request(job_id, file_name);

        tracing::info!(
            job_id,
            media_uri = %request.media_uri,
            language_code = %request.language_code,
            "Starting transcription"
        );

        let handle = self.service.start(&request).await.map_err(|e| {
            tracing::error!(job_id, error = %e, "Transcription start failed");
            PipelineError::service(e.to_string())
        })?;
        tracing::debug!(job_id, handle = %handle, "Transcription job accepted");

        Ok(event)
    }
}
