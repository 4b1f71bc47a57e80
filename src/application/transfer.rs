//! Moving media between the object store and a job workspace

use std::path::PathBuf;

use crate::domain::error::PipelineError;
use crate::domain::job::{path_component, JobWorkspace};

use super::ports::ObjectStore;

/// Buckets the pipeline reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub input: String,
    pub output: String,
}

/// Key of the transcript the service writes for `job_id`
pub fn transcript_key(job_id: &str) -> String {
    format!("{}.json", job_id)
}

/// Object store transfers scoped to job workspaces
pub struct WorkspaceTransfer<O: ObjectStore> {
    store: O,
    buckets: Buckets,
    workspace_root: PathBuf,
    clip_extension: String,
}

impl<O: ObjectStore> WorkspaceTransfer<O> {
    pub fn new(
        store: O,
        buckets: Buckets,
        workspace_root: impl Into<PathBuf>,
        clip_extension: impl Into<String>,
    ) -> Self {
        Self {
            store,
            buckets,
            workspace_root: workspace_root.into(),
            clip_extension: clip_extension.into(),
        }
    }

    fn workspace(&self, job_id: &str, file_name: &str) -> Result<JobWorkspace, PipelineError> {
        path_component("file_name", file_name)?;
        Ok(JobWorkspace::new(
            &self.workspace_root,
            path_component("job_id", job_id)?,
            self.clip_extension.as_str(),
        ))
    }

    /// Prepare the workspace and download the source and its transcript.
    ///
    /// The transcript object is removed once it has been copied.
    pub async fn fetch(&self, job_id: &str, file_name: &str) -> Result<JobWorkspace, PipelineError> {
        let workspace = self.workspace(job_id, file_name)?;
        for dir in [workspace.input_dir(), workspace.clipped_dir()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                PipelineError::storage(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let source = workspace.source_path(file_name);
        self.store
            .fetch(&self.buckets.input, file_name, &source)
            .await
            .map_err(|e| {
                tracing::error!(job_id, file_name, error = %e, "Source download failed");
                PipelineError::storage(e.to_string())
            })?;

        let key = transcript_key(job_id);
        self.store
            .fetch(&self.buckets.output, &key, &workspace.transcript_path())
            .await
            .map_err(|e| {
                tracing::error!(job_id, key = %key, error = %e, "Transcript download failed");
                PipelineError::storage(e.to_string())
            })?;

        self.store
            .delete(&self.buckets.output, &key)
            .await
            .map_err(|e| PipelineError::storage(e.to_string()))?;

        tracing::info!(job_id, file_name, dir = %workspace.job_dir().display(), "Workspace ready");
        Ok(workspace)
    }

    /// Upload the reassembled output and discard the workspace.
    ///
    /// Cleanup is best effort; a leftover directory is only logged.
    pub async fn publish(&self, job_id: &str, file_name: &str) -> Result<(), PipelineError> {
        let workspace = self.workspace(job_id, file_name)?;
        let output = workspace.output_path(file_name);

        self.store
            .put(&self.buckets.output, file_name, &output)
            .await
            .map_err(|e| {
                tracing::error!(job_id, file_name, error = %e, "Upload failed");
                PipelineError::storage(e.to_string())
            })?;
        tracing::info!(job_id, bucket = %self.buckets.output, file_name, "Output published");

        if let Err(e) = tokio::fs::remove_dir_all(workspace.job_dir()).await {
            tracing::warn!(
                job_id,
                dir = %workspace.job_dir().display(),
                error = %e,
                "Failed to remove workspace"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::infrastructure::storage::LocalObjectStore;
    use std::path::Path;

    fn setup(root: &Path) -> (LocalObjectStore, WorkspaceTransfer<LocalObjectStore>) {
        let store = LocalObjectStore::new(root.join("storage"));
        let transfer = WorkspaceTransfer::new(
            store.clone(),
            Buckets {
                input: "in".to_string(),
                output: "out".to_string(),
            },
            root.join("work"),
            "mp4",
        );
        (store, transfer)
    }

    fn seed(root: &Path, bucket: &str, key: &str, body: &str) {
        let path = root.join("storage").join(bucket).join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn fetch_populates_workspace_and_consumes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        seed(dir.path(), "in", "talk.mp4", "video");
        seed(dir.path(), "out", "job.json", "{}");

        let ws = transfer.fetch("job", "talk.mp4").await.unwrap();

        assert_eq!(std::fs::read_to_string(ws.source_path("talk.mp4")).unwrap(), "video");
        assert_eq!(std::fs::read_to_string(ws.transcript_path()).unwrap(), "{}");
        assert!(ws.clipped_dir().is_dir());
        assert!(!dir.path().join("storage/out/job.json").exists());
    }

    #[tokio::test]
    async fn fetch_without_transcript_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        seed(dir.path(), "in", "talk.mp4", "video");

        let err = transfer.fetch("job", "talk.mp4").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn publish_uploads_and_removes_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        let output = dir.path().join("work/job/output/talk.mp4");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();
        std::fs::write(&output, "joined").unwrap();

        transfer.publish("job", "talk.mp4").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("storage/out/talk.mp4")).unwrap(),
            "joined"
        );
        assert!(!dir.path().join("work/job").exists());
    }

    #[tokio::test]
    async fn publish_without_output_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        let err = transfer.publish("job", "talk.mp4").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn publish_refuses_job_outside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        std::fs::create_dir_all(dir.path().join("work")).unwrap();
        let neighbour = dir.path().join("victim");
        std::fs::create_dir_all(neighbour.join("output")).unwrap();
        std::fs::write(neighbour.join("output/a.mp4"), "joined").unwrap();
        std::fs::write(neighbour.join("precious.txt"), "keep").unwrap();

        let err = transfer.publish("../victim", "a.mp4").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(neighbour.join("precious.txt").exists());
        assert!(!dir.path().join("storage/out/a.mp4").exists());
    }

    #[tokio::test]
    async fn fetch_refuses_nested_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, transfer) = setup(dir.path());
        let err = transfer.fetch("job", "../talk.mp4").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(!dir.path().join("work/job").exists());
    }

    #[test]
    fn transcript_key_is_job_json() {
        assert_eq!(transcript_key("abc"), "abc.json");
    }
}
