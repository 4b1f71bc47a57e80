//! Filesystem-backed ledger adapter

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{Ledger, LedgerError};
use crate::domain::job::{path_component, LedgerEntry};

/// Ledger stored as one JSON file per entry:
/// `<root>/<job_id>/<index>.json`.
///
/// Writes go to a temp file and are renamed into place, so a reader never
/// sees a partial entry.
#[derive(Debug, Clone)]
pub struct FsLedger {
    root: PathBuf,
}

impl FsLedger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn job_dir(&self, job_id: &str) -> Result<PathBuf, LedgerError> {
        let id = path_component("job_id", job_id)
            .map_err(|e| LedgerError::InvalidKey(e.message))?;
        Ok(self.root.join(id))
    }

    fn entry_path(&self, job_id: &str, index: u32) -> Result<PathBuf, LedgerError> {
        Ok(self.job_dir(job_id)?.join(format!("{}.json", index)))
    }
}

#[async_trait]
impl Ledger for FsLedger {
    async fn put(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let dir = self.job_dir(&entry.job_id)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;

        let content =
            serde_json::to_vec(entry).map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        let path = self.entry_path(&entry.job_id, entry.index)?;
        let tmp = dir.join(format!(".{}.{}.tmp", entry.index, uuid::Uuid::new_v4()));

        fs::write(&tmp, content)
            .await
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))
    }

    async fn get(&self, job_id: &str, index: u32) -> Result<Option<LedgerEntry>, LedgerError> {
        let path = self.entry_path(job_id, index)?;
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::ReadFailed(e.to_string())),
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| LedgerError::Corrupt(format!("{}: {}", path.display(), e)))
    }

    async fn delete(&self, job_id: &str, index: u32) -> Result<(), LedgerError> {
        match fs::remove_file(self.entry_path(job_id, index)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(LedgerError::WriteFailed(e.to_string())),
        }
    }

    async fn count(&self, job_id: &str) -> Result<usize, LedgerError> {
        let mut dir = match fs::read_dir(self.job_dir(job_id)?).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LedgerError::ReadFailed(e.to_string())),
        };

        let mut count = 0;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| LedgerError::ReadFailed(e.to_string()))?
        {
            let name = item.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with('.') && name.ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u32) -> LedgerEntry {
        LedgerEntry {
            job_id: "job-1".to_string(),
            index,
            file_name: "talk.mp4".to_string(),
            start_time: "12.34".parse().unwrap(),
            duration: "0.5".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path());

        ledger.put(&entry(0)).await.unwrap();
        ledger.put(&entry(1)).await.unwrap();
        assert_eq!(ledger.count("job-1").await.unwrap(), 2);
        assert_eq!(ledger.get("job-1", 1).await.unwrap(), Some(entry(1)));

        ledger.delete("job-1", 1).await.unwrap();
        assert!(ledger.get("job-1", 1).await.unwrap().is_none());
        assert_eq!(ledger.count("job-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_job_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path());
        assert_eq!(ledger.count("nope").await.unwrap(), 0);
        assert!(ledger.get("nope", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_absent_entry_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path());
        ledger.delete("job-1", 9).await.unwrap();
    }

    #[tokio::test]
    async fn put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path());
        ledger.put(&entry(0)).await.unwrap();
        let changed = LedgerEntry {
            duration: "9".parse().unwrap(),
            ..entry(0)
        };
        ledger.put(&changed).await.unwrap();
        assert_eq!(ledger.count("job-1").await.unwrap(), 1);
        assert_eq!(ledger.get("job-1", 0).await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn job_id_outside_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path().join("ledger"));
        std::fs::create_dir_all(dir.path().join("other")).unwrap();
        std::fs::write(dir.path().join("other/0.json"), "{}").unwrap();

        assert!(matches!(
            ledger.delete("../other", 0).await,
            Err(LedgerError::InvalidKey(_))
        ));
        assert!(matches!(
            ledger.count("../other").await,
            Err(LedgerError::InvalidKey(_))
        ));
        let escaping = LedgerEntry {
            job_id: "/tmp".to_string(),
            ..entry(0)
        };
        assert!(matches!(
            ledger.put(&escaping).await,
            Err(LedgerError::InvalidKey(_))
        ));
        assert!(dir.path().join("other/0.json").exists());
    }

    #[tokio::test]
    async fn corrupt_entry_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsLedger::new(dir.path());
        std::fs::create_dir_all(dir.path().join("job-1")).unwrap();
        std::fs::write(dir.path().join("job-1/0.json"), "{").unwrap();
        assert!(matches!(
            ledger.get("job-1", 0).await,
            Err(LedgerError::Corrupt(_))
        ));
    }
}
