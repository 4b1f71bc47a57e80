//! Pipeline step runners
//!
//! Every step is one short-lived invocation: it reads a step event, does
//! its work through the adapters built from the merged config, and prints
//! the event for the next step on stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::AsyncReadExt;

use crate::application::ports::ConfigStore;
use crate::application::{
    read_transcript, start_jobs, BoundedPoller, Buckets, ClipOutcome, ClipWorker, Concatenator,
    Dispatcher, DrainReport, LedgerDrainProbe, TranscriptionJobProbe, TranscriptionSettings,
    TranscriptionStarter, WorkspaceTransfer,
};
use crate::domain::config::AppConfig;
use crate::domain::error::{ConfigError, ErrorKind, PipelineError};
use crate::domain::job::{JobWorkspace, StepEvent, WorkMessage};
use crate::domain::polling::PollState;
use crate::domain::segment::Segmenter;
use crate::infrastructure::{
    FfmpegTranscoder, FsLedger, HttpTranscriptionService, LocalObjectStore, SpoolQueue,
    XdgConfigStore,
};

use super::args::{Cli, Commands, EventArgs, PollArgs};
use super::config_cmd::handle_config_command;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_TIMEOUT: u8 = 3;

/// Exit code for a failed step
pub fn exit_code(err: &PipelineError) -> u8 {
    match err.kind {
        ErrorKind::Configuration => EXIT_USAGE_ERROR,
        ErrorKind::Timeout => EXIT_TIMEOUT,
        _ => EXIT_ERROR,
    }
}

/// Load and merge configuration: defaults < file < env < cli
pub async fn load_merged_config<S: ConfigStore>(
    store: &S,
    cli_config: AppConfig,
) -> Result<AppConfig, ConfigError> {
    let file_config = store.load().await?;

    let config = AppConfig::defaults()
        .merge(file_config)
        .merge(AppConfig::from_env()?)
        .merge(cli_config);
    config.validate()?;
    Ok(config)
}

/// Run the parsed command line
pub async fn run(cli: Cli) -> ExitCode {
    let presenter = Presenter::new();
    let store = match &cli.config {
        Some(path) => XdgConfigStore::with_path(path),
        None => XdgConfigStore::new(),
    };

    let command = match cli.command {
        Commands::Config { action } => {
            return match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::from(EXIT_SUCCESS),
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            };
        }
        command => command,
    };

    let config = match load_merged_config(&store, cli.overrides.to_config()).await {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let pipeline = Pipeline::new(config);
    match execute(&pipeline, &presenter, command).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            tracing::debug!(kind = %e.kind, message = %e.message, "Step failed");
            presenter.pipeline_error(&e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn execute(
    pipeline: &Pipeline,
    presenter: &Presenter,
    command: Commands,
) -> Result<(), PipelineError> {
    match command {
        Commands::Start { files } => {
            for event in pipeline.start(&files)? {
                presenter.event(&event)?;
            }
        }
        Commands::Transcribe(args) => {
            let event = pipeline.transcribe(read_event(args).await?).await?;
            presenter.event(&event)?;
        }
        Commands::TranscribeStatus(args) => {
            let fail_on_timeout = args.fail_on_timeout;
            let event = pipeline.transcribe_status(read_poll_event(args).await?).await?;
            finish_poll(pipeline, presenter, event, fail_on_timeout)?;
        }
        Commands::Fetch(args) => {
            let event = pipeline.fetch(read_event(args).await?).await?;
            presenter.event(&event)?;
        }
        Commands::Dispatch(args) => {
            let event = pipeline.dispatch(read_event(args).await?).await?;
            presenter.event(&event)?;
        }
        Commands::Clip { message } => {
            let message = parse_work_message(&read_input(message, "work message").await?)?;
            match pipeline.clip(&message).await? {
                ClipOutcome::Clipped { output } => {
                    presenter.success(&format!("Clipped {}", output.display()))
                }
                ClipOutcome::AlreadyDone => presenter.info(&format!(
                    "Segment {} of {} already clipped",
                    message.index, message.job_id
                )),
            }
        }
        Commands::Work { batch } => {
            let report = pipeline.work(batch).await?;
            presenter.drain_report(&report);
            if let Some((_, first)) = report.failed.first() {
                return Err(PipelineError::new(
                    first.kind,
                    format!(
                        "{} of {} work units failed",
                        report.failed.len(),
                        report.received()
                    ),
                ));
            }
        }
        Commands::ClipStatus(args) => {
            let fail_on_timeout = args.fail_on_timeout;
            let event = pipeline.clip_status(read_poll_event(args).await?).await?;
            finish_poll(pipeline, presenter, event, fail_on_timeout)?;
        }
        Commands::Concat(args) => {
            let event = pipeline.concat(read_event(args).await?).await?;
            presenter.event(&event)?;
        }
        Commands::Publish(args) => {
            let event = pipeline.publish(read_event(args).await?).await?;
            presenter.event(&event)?;
        }
        Commands::Config { .. } => {
            return Err(PipelineError::configuration("config is not a pipeline step"));
        }
    }
    Ok(())
}

/// Print the advanced event, then fail if asked and the wait timed out
fn finish_poll(
    pipeline: &Pipeline,
    presenter: &Presenter,
    event: StepEvent,
    fail_on_timeout: bool,
) -> Result<(), PipelineError> {
    presenter.event(&event)?;
    if fail_on_timeout {
        pipeline.poller().check_timeout(event.poll_state())?;
    }
    Ok(())
}

/// Inline argument, or all of stdin when absent
async fn read_input(arg: Option<String>, what: &str) -> Result<String, PipelineError> {
    if let Some(text) = arg {
        return Ok(text);
    }

    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(|e| PipelineError::configuration(format!("cannot read {}: {}", what, e)))?;

    if buf.trim().is_empty() {
        return Err(PipelineError::configuration(format!("missing {}", what)));
    }
    Ok(buf)
}

async fn read_event(args: EventArgs) -> Result<StepEvent, PipelineError> {
    StepEvent::from_json(&read_input(args.event, "step event").await?)
}

async fn read_poll_event(args: PollArgs) -> Result<StepEvent, PipelineError> {
    read_event(args.input).await
}

fn parse_work_message(content: &str) -> Result<WorkMessage, PipelineError> {
    serde_json::from_str(content)
        .map_err(|e| PipelineError::configuration(format!("invalid work message: {}", e)))
}

/// Adapters and use cases wired from one merged config
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn workspace_root(&self) -> PathBuf {
        self.config.workspace_dir_or_default()
    }

    fn clip_extension(&self) -> &str {
        self.config.media_format_or_default()
    }

    fn workspace(&self, job_id: &str) -> JobWorkspace {
        JobWorkspace::new(self.workspace_root(), job_id, self.clip_extension())
    }

    fn poller(&self) -> BoundedPoller {
        BoundedPoller::new(self.config.max_poll_count_or_default())
    }

    fn ledger(&self) -> FsLedger {
        FsLedger::new(self.config.ledger_dir_or_default())
    }

    fn queue(&self) -> SpoolQueue {
        SpoolQueue::new(self.config.queue_dir_or_default())
    }

    fn store(&self) -> LocalObjectStore {
        LocalObjectStore::new(self.config.storage_root_or_default())
    }

    fn transcoder(&self) -> FfmpegTranscoder {
        FfmpegTranscoder::with_program(self.config.ffmpeg_path_or_default())
    }

    fn transcription_service(&self) -> Result<HttpTranscriptionService, PipelineError> {
        let service = HttpTranscriptionService::new(self.config.require_transcription_endpoint()?);
        Ok(match &self.config.transcription_api_key {
            Some(key) => service.with_api_key(key.as_str()),
            None => service,
        })
    }

    fn buckets(&self) -> Result<Buckets, PipelineError> {
        Ok(Buckets {
            input: self.config.require_input_bucket()?.to_string(),
            output: self.config.require_output_bucket()?.to_string(),
        })
    }

    fn transfer(&self) -> Result<WorkspaceTransfer<LocalObjectStore>, PipelineError> {
        Ok(WorkspaceTransfer::new(
            self.store(),
            self.buckets()?,
            self.workspace_root(),
            self.clip_extension(),
        ))
    }

    fn clip_worker(&self) -> ClipWorker<FsLedger, FfmpegTranscoder> {
        ClipWorker::new(
            self.ledger(),
            self.transcoder(),
            self.workspace_root(),
            self.clip_extension(),
        )
    }

    /// Opening events for new jobs
    pub fn start(&self, files: &[String]) -> Result<Vec<StepEvent>, PipelineError> {
        start_jobs(files)
    }

    /// Start transcription of the event's source file
    pub async fn transcribe(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let buckets = self.buckets()?;
        let service = self.transcription_service()?;
        let store = self.store();
        let settings = TranscriptionSettings {
            input_bucket: buckets.input,
            output_bucket: buckets.output,
            media_format: self.config.media_format_or_default().to_string(),
            language_code: self.config.language_code_or_default().to_string(),
        };

        TranscriptionStarter::new(&service, &store, settings)
            .start(event)
            .await
    }

    /// One observation of the transcription job
    pub async fn transcribe_status(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let service = self.transcription_service()?;
        let probe = TranscriptionJobProbe::new(&service, job_id);

        let next = self.poller().poll(&probe, event.poll_state()).await?;
        Ok(event.with_poll(next))
    }

    /// Populate the job workspace
    pub async fn fetch(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let file_name = event.require_file_name()?;
        self.transfer()?.fetch(job_id, file_name).await?;
        Ok(event)
    }

    /// Segment and fan out; the event gains its segment count and a fresh
    /// poll state for the clip wait
    pub async fn dispatch(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let file_name = event.require_file_name()?;

        let transcript = read_transcript(&self.workspace(job_id).transcript_path()).await?;
        let segmenter = Segmenter::new(self.config.silence_threshold_or_default()?);
        let dispatcher = Dispatcher::new(self.ledger(), self.queue());

        let job = dispatcher
            .dispatch_transcript(job_id, file_name, &transcript, &segmenter)
            .await?;

        Ok(event
            .with_segment_count(job.segment_count)
            .with_poll(PollState::initial()))
    }

    /// Handle one work message
    pub async fn clip(&self, message: &WorkMessage) -> Result<ClipOutcome, PipelineError> {
        self.clip_worker().process(message).await
    }

    /// Drain up to `batch` messages from the queue
    pub async fn work(&self, batch: usize) -> Result<DrainReport, PipelineError> {
        let queue = self.queue();
        Arc::new(self.clip_worker()).drain(&queue, batch).await
    }

    /// One observation of the job's clip ledger
    pub async fn clip_status(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let ledger = self.ledger();
        let probe = LedgerDrainProbe::new(&ledger, job_id);

        let next = self.poller().poll(&probe, event.poll_state()).await?;
        Ok(event.with_poll(next))
    }

    /// Join the job's clips
    pub async fn concat(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job = event.job()?;
        let output = Concatenator::new(
            self.transcoder(),
            self.workspace_root(),
            self.clip_extension(),
        )
        .concat(&job)
        .await?;
        tracing::info!(job_id = %job.job_id, output = %output.display(), "Output assembled");
        Ok(event)
    }

    /// Upload the output and drop the workspace
    pub async fn publish(&self, event: StepEvent) -> Result<StepEvent, PipelineError> {
        let job_id = event.require_job_id()?;
        let file_name = event.require_file_name()?;
        self.transfer()?.publish(job_id, file_name).await?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(root: &std::path::Path) -> Pipeline {
        Pipeline::new(AppConfig {
            workspace_dir: Some(root.join("work").to_string_lossy().to_string()),
            ledger_dir: Some(root.join("ledger").to_string_lossy().to_string()),
            queue_dir: Some(root.join("queue").to_string_lossy().to_string()),
            storage_root: Some(root.join("storage").to_string_lossy().to_string()),
            ..AppConfig::defaults()
        })
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(exit_code(&PipelineError::configuration("x")), EXIT_USAGE_ERROR);
        assert_eq!(exit_code(&PipelineError::timeout("x")), EXIT_TIMEOUT);
        assert_eq!(exit_code(&PipelineError::clip("x")), EXIT_ERROR);
        assert_eq!(exit_code(&PipelineError::storage("x")), EXIT_ERROR);
    }

    #[test]
    fn work_message_accepts_legacy_job_name() {
        let message = parse_work_message(r#"{"job_name": "j", "index": 3}"#).unwrap();
        assert_eq!(message.job_id, "j");
        assert_eq!(message.index, 3);
        assert_eq!(
            parse_work_message("[]").unwrap_err().kind,
            ErrorKind::Configuration
        );
    }

    #[tokio::test]
    async fn zero_poll_count_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_poll_count = 0\n").unwrap();
        let store = XdgConfigStore::with_path(&path);

        let err = load_merged_config(&store, AppConfig::empty())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("max_poll_count"));
    }

    #[tokio::test]
    async fn negative_threshold_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("absent.toml"));
        let flags = AppConfig {
            silence_threshold: Some("-0.5".to_string()),
            ..Default::default()
        };

        let err = load_merged_config(&store, flags).await.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn missing_buckets_are_configuration_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(dir.path())
            .fetch(StepEvent::start("j", "a.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("SPEECHCUT_INPUT_BUCKET"));
    }

    #[tokio::test]
    async fn dispatch_then_clip_status_waits() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let transcript = dir.path().join("work/j/input/transcription.json");
        std::fs::create_dir_all(transcript.parent().unwrap()).unwrap();
        std::fs::write(
            &transcript,
            r#"{"results": {"items": [
                {"type": "pronunciation", "start_time": "0.0", "end_time": "1.0"},
                {"type": "pronunciation", "start_time": "2.0", "end_time": "3.0"}
            ]}}"#,
        )
        .unwrap();

        let event = pipeline
            .dispatch(StepEvent::start("j", "a.mp4"))
            .await
            .unwrap();
        assert_eq!(event.segment_count, Some(2));

        let waiting = pipeline.clip_status(event).await.unwrap();
        assert_eq!(waiting.poll_state().index, 1);
        assert!(waiting.poll_state().should_continue);
    }

    #[tokio::test]
    async fn clip_status_on_empty_ledger_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let event = StepEvent {
            job_id: Some("j".to_string()),
            ..Default::default()
        };
        let done = pipeline(dir.path()).clip_status(event).await.unwrap();
        assert!(done.poll_state().is_success());
    }
}
