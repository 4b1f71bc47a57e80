//! Per-job scratch directory layout

use std::path::{Component, Path, PathBuf};

use crate::domain::error::PipelineError;

/// File name of the downloaded transcript inside `input/`
pub const TRANSCRIPT_FILE_NAME: &str = "transcription.json";

/// Accept `value` only as a single plain path component.
///
/// Job ids and file names are joined under the workspace, ledger and
/// queue roots; `..`, separators and absolute paths would escape them.
pub fn path_component<'a>(field: &str, value: &'a str) -> Result<&'a str, PipelineError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == value => Ok(value),
        _ => Err(PipelineError::configuration(format!(
            "invalid {} {:?}: must be a single file name",
            field, value
        ))),
    }
}

/// Paths of one job's working files:
///
/// ```text
/// <root>/<job_id>/input/<file_name>
/// <root>/<job_id>/input/transcription.json
/// <root>/<job_id>/clipped/<index>.<ext>
/// <root>/<job_id>/output/<file_name>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWorkspace {
    job_dir: PathBuf,
    clip_extension: String,
}

impl JobWorkspace {
    pub fn new(root: impl AsRef<Path>, job_id: &str, clip_extension: impl Into<String>) -> Self {
        Self {
            job_dir: root.as_ref().join(job_id),
            clip_extension: clip_extension.into(),
        }
    }

    pub fn job_dir(&self) -> &Path {
        &self.job_dir
    }

    pub fn input_dir(&self) -> PathBuf {
        self.job_dir.join("input")
    }

    pub fn clipped_dir(&self) -> PathBuf {
        self.job_dir.join("clipped")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.job_dir.join("output")
    }

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.input_dir().join(file_name)
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.input_dir().join(TRANSCRIPT_FILE_NAME)
    }

    pub fn clip_path(&self, index: u32) -> PathBuf {
        self.clipped_dir()
            .join(format!("{}.{}", index, self.clip_extension))
    }

    /// Private file a clip is written to before it is moved onto
    /// [`clip_path`](Self::clip_path). Hidden, so directory listings skip it.
    pub fn staging_clip_path(&self, index: u32, tag: &str) -> PathBuf {
        self.clipped_dir()
            .join(format!(".{}.{}.{}", index, tag, self.clip_extension))
    }

    /// Clip paths `0..segment_count` in reassembly order
    pub fn clip_paths(&self, segment_count: u32) -> Vec<PathBuf> {
        (0..segment_count).map(|i| self.clip_path(i)).collect()
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir().join(file_name)
    }
}
