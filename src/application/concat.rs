//! Reassembly use case

use std::path::PathBuf;

use crate::domain::error::PipelineError;
use crate::domain::job::{path_component, Job, JobWorkspace};

use super::ports::MediaTranscoder;

/// Joins a job's clips `0..segment_count` into the output file
pub struct Concatenator<T: MediaTranscoder> {
    transcoder: T,
    workspace_root: PathBuf,
    clip_extension: String,
}

impl<T: MediaTranscoder> Concatenator<T> {
    pub fn new(
        transcoder: T,
        workspace_root: impl Into<PathBuf>,
        clip_extension: impl Into<String>,
    ) -> Self {
        Self {
            transcoder,
            workspace_root: workspace_root.into(),
            clip_extension: clip_extension.into(),
        }
    }

    /// Concatenate in index order. Returns the output path.
    ///
    /// Must only run once the ledger has drained: every clip is checked
    /// up front and a missing one fails the job.
    pub async fn concat(&self, job: &Job) -> Result<PathBuf, PipelineError> {
        if job.segment_count == 0 {
            return Err(PipelineError::concat(format!(
                "job {} has no segments to join",
                job.job_id
            )));
        }

        path_component("file_name", &job.file_name)?;
        let workspace = JobWorkspace::new(
            &self.workspace_root,
            path_component("job_id", &job.job_id)?,
            self.clip_extension.as_str(),
        );
        let clips = workspace.clip_paths(job.segment_count);

        for clip in &clips {
            let present = tokio::fs::try_exists(clip).await.map_err(|e| {
                PipelineError::concat(format!("cannot inspect {}: {}", clip.display(), e))
            })?;
            if !present {
                tracing::error!(job_id = %job.job_id, clip = %clip.display(), "Clip missing");
                return Err(PipelineError::concat(format!(
                    "missing clip {}",
                    clip.display()
                )));
            }
        }

        let output_dir = workspace.output_dir();
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            PipelineError::concat(format!("cannot create {}: {}", output_dir.display(), e))
        })?;
        let output = workspace.output_path(&job.file_name);

        tracing::info!(
            job_id = %job.job_id,
            segment_count = job.segment_count,
            output = %output.display(),
            "Concatenating clips"
        );

        self.transcoder.concat(&clips, &output).await.map_err(|e| {
            tracing::error!(job_id = %job.job_id, error = %e, "Concat failed");
            PipelineError::concat(e.to_string())
        })?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TranscodeError;
    use crate::domain::error::ErrorKind;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Records the inputs it was asked to join
    #[derive(Clone, Default)]
    struct RecordingTranscoder {
        joined: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    #[async_trait]
    impl MediaTranscoder for RecordingTranscoder {
        async fn clip(
            &self,
            _start: Decimal,
            _duration: Decimal,
            _input: &Path,
            _output: &Path,
        ) -> Result<(), TranscodeError> {
            Ok(())
        }

        async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), TranscodeError> {
            if self.fail {
                return Err(TranscodeError::Failed {
                    status: 1,
                    message: "bad stream".to_string(),
                });
            }
            *self.joined.lock().unwrap() = inputs.to_vec();
            std::fs::write(output, b"joined").map_err(|e| TranscodeError::Io(e.to_string()))
        }
    }

    fn job(count: u32) -> Job {
        Job {
            job_id: "job".to_string(),
            file_name: "talk.mp4".to_string(),
            segment_count: count,
        }
    }

    fn write_clips(root: &Path, count: u32) {
        let dir = root.join("job/clipped");
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            std::fs::write(dir.join(format!("{}.mp4", i)), b"clip").unwrap();
        }
    }

    #[tokio::test]
    async fn joins_clips_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        // Lexical order would put 10.mp4 before 2.mp4
        write_clips(dir.path(), 11);
        let transcoder = RecordingTranscoder::default();
        let concat = Concatenator::new(transcoder.clone(), dir.path(), "mp4");

        let output = concat.concat(&job(11)).await.unwrap();

        assert_eq!(output, dir.path().join("job/output/talk.mp4"));
        assert!(output.exists());
        let joined = transcoder.joined.lock().unwrap().clone();
        assert_eq!(joined.len(), 11);
        assert_eq!(joined[2], dir.path().join("job/clipped/2.mp4"));
        assert_eq!(joined[10], dir.path().join("job/clipped/10.mp4"));
    }

    #[tokio::test]
    async fn zero_segments_is_concat_error() {
        let dir = tempfile::tempdir().unwrap();
        let concat = Concatenator::new(RecordingTranscoder::default(), dir.path(), "mp4");
        let err = concat.concat(&job(0)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConcatExecution);
    }

    #[tokio::test]
    async fn absolute_job_id_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = RecordingTranscoder::default();
        let concat = Concatenator::new(transcoder.clone(), dir.path(), "mp4");
        let job = Job {
            job_id: dir.path().join("elsewhere").display().to_string(),
            ..job(1)
        };

        let err = concat.concat(&job).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(transcoder.joined.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_clip_is_concat_error() {
        let dir = tempfile::tempdir().unwrap();
        write_clips(dir.path(), 2);
        let transcoder = RecordingTranscoder::default();
        let concat = Concatenator::new(transcoder.clone(), dir.path(), "mp4");

        let err = concat.concat(&job(3)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConcatExecution);
        assert!(err.message.contains("2.mp4"));
        assert!(transcoder.joined.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transcoder_failure_is_concat_error() {
        let dir = tempfile::tempdir().unwrap();
        write_clips(dir.path(), 1);
        let transcoder = RecordingTranscoder {
            fail: true,
            ..Default::default()
        };
        let err = Concatenator::new(transcoder, dir.path(), "mp4")
            .concat(&job(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConcatExecution);
    }
}
