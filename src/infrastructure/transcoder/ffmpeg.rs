//! FFmpeg-based transcoder adapter

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::fs;
use tokio::process::Command;

use crate::application::ports::{MediaTranscoder, TranscodeError};

/// Name of the concat demuxer list written next to the output
const CONCAT_LIST_FILE: &str = "concat.txt";

/// Runs the `ffmpeg` binary for clip and concat
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Use a specific binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build FFmpeg args for cutting one segment
    fn build_clip_args(
        start: Decimal,
        duration: Decimal,
        input: &Path,
        output: &Path,
    ) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output, a redelivered clip replaces its file
            "-ss".to_string(),
            start.normalize().to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-t".to_string(),
            duration.normalize().to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Build FFmpeg args for joining the clips listed in `list`
    fn build_concat_args(list: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Concat demuxer list, one `file '<path>'` line per input
    fn concat_list(inputs: &[PathBuf]) -> String {
        inputs
            .iter()
            .map(|p| {
                let path = p.to_string_lossy().replace('\'', r"'\''");
                format!("file '{}'\n", path)
            })
            .collect()
    }

    /// Run FFmpeg to completion
    async fn run(&self, args: Vec<String>) -> Result<(), TranscodeError> {
        tracing::debug!(program = %self.program, args = ?args, "Running transcoder");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::NotFound(self.program.clone())
                } else {
                    TranscodeError::StartFailed(e.to_string())
                }
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(stderr = %stderr, "Transcoder failed");
        Err(TranscodeError::Failed {
            status: output.status.code().unwrap_or(-1),
            message: stderr
                .lines()
                .last()
                .unwrap_or("unknown error")
                .to_string(),
        })
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn clip(
        &self,
        start: Decimal,
        duration: Decimal,
        input: &Path,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        self.run(Self::build_clip_args(start, duration, input, output))
            .await
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), TranscodeError> {
        let list = output
            .parent()
            .map(|dir| dir.join(CONCAT_LIST_FILE))
            .unwrap_or_else(|| PathBuf::from(CONCAT_LIST_FILE));

        fs::write(&list, Self::concat_list(inputs))
            .await
            .map_err(|e| TranscodeError::Io(format!("{}: {}", list.display(), e)))?;

        let result = self.run(Self::build_concat_args(&list, output)).await;

        // Best-effort cleanup
        let _ = fs::remove_file(&list).await;
        result
    }
}
