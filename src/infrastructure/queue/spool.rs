//! Spool-directory queue adapter

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{Delivery, MessageQueue, QueueError};
use crate::domain::job::WorkMessage;

/// Subdirectory unreadable messages are moved to
pub const DEAD_LETTER_DIR: &str = "dead";

/// Queue backed by a directory with one JSON file per message.
///
/// File names start with the send time so a sorted listing is oldest
/// first. The receipt is the file name; acknowledging removes the file.
/// A file that does not decode as a work message is dead-lettered into
/// `<dir>/dead/` on the first receive that sees it.
#[derive(Debug, Clone)]
pub struct SpoolQueue {
    dir: PathBuf,
}

impl SpoolQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn message_file_name() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("{:024}-{}.json", nanos, uuid::Uuid::new_v4())
    }

    pub fn dead_letter_dir(&self) -> PathBuf {
        self.dir.join(DEAD_LETTER_DIR)
    }

    async fn dead_letter(&self, name: &str) {
        let dead = self.dead_letter_dir();
        let moved = match fs::create_dir_all(&dead).await {
            Ok(()) => fs::rename(self.dir.join(name), dead.join(name)).await,
            Err(e) => Err(e),
        };
        match moved {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Could not dead-letter queue message")
            }
        }
    }

    /// Receipt must be a bare file name inside the spool directory
    fn receipt_path(&self, receipt: &str) -> Result<PathBuf, QueueError> {
        let name = Path::new(receipt);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(QueueError::AckFailed(format!("invalid receipt: {}", receipt)));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl MessageQueue for SpoolQueue {
    async fn send(&self, message: &WorkMessage) -> Result<(), QueueError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| QueueError::SendFailed(e.to_string()))?;

        let body =
            serde_json::to_vec(message).map_err(|e| QueueError::SendFailed(e.to_string()))?;
        let name = Self::message_file_name();
        let tmp = self.dir.join(format!(".{}", name));

        fs::write(&tmp, body)
            .await
            .map_err(|e| QueueError::SendFailed(e.to_string()))?;
        fs::rename(&tmp, self.dir.join(&name))
            .await
            .map_err(|e| QueueError::SendFailed(e.to_string()))
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, QueueError> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(QueueError::ReceiveFailed(e.to_string())),
        };

        let mut names = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| QueueError::ReceiveFailed(e.to_string()))?
        {
            let name = item.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') && name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();

        let mut deliveries = Vec::new();
        for name in names {
            if deliveries.len() >= max {
                break;
            }
            let body = match fs::read(self.dir.join(&name)).await {
                Ok(body) => body,
                // Acknowledged by a concurrent consumer since the listing
                Err(e) if e.kind() == IoErrorKind::NotFound => continue,
                Err(e) => return Err(QueueError::ReceiveFailed(e.to_string())),
            };
            match serde_json::from_slice::<WorkMessage>(&body) {
                Ok(message) => deliveries.push(Delivery {
                    receipt: name,
                    message,
                }),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Dead-lettering unreadable queue message");
                    self.dead_letter(&name).await;
                }
            }
        }
        Ok(deliveries)
    }

    async fn ack(&self, receipt: &str) -> Result<(), QueueError> {
        match fs::remove_file(self.receipt_path(receipt)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(QueueError::AckFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(index: u32) -> WorkMessage {
        WorkMessage {
            job_id: "job".to_string(),
            index,
        }
    }

    #[tokio::test]
    async fn receive_from_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let queue = SpoolQueue::new(dir.path().join("absent"));
        assert!(queue.receive(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_receive_ack() {
        let dir = tempfile::tempdir().unwrap();
        let queue = SpoolQueue::new(dir.path());
        for i in 0..3 {
            queue.send(&message(i)).await.unwrap();
        }

        let deliveries = queue.receive(10).await.unwrap();
        let indices: Vec<u32> = deliveries.iter().map(|d| d.message.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        queue.ack(&deliveries[1].receipt).await.unwrap();
        queue.ack(&deliveries[1].receipt).await.unwrap();
        assert_eq!(queue.receive(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_message_is_dead_lettered() {
        let dir = tempfile::tempdir().unwrap();
        let queue = SpoolQueue::new(dir.path());
        std::fs::write(dir.path().join("0-bad.json"), "garbage").unwrap();
        queue.send(&message(7)).await.unwrap();

        let deliveries = queue.receive(10).await.unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].message.index, 7);

        assert!(!dir.path().join("0-bad.json").exists());
        assert_eq!(
            std::fs::read_to_string(queue.dead_letter_dir().join("0-bad.json")).unwrap(),
            "garbage"
        );

        // later receives no longer see it
        let again = queue.receive(10).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].message.index, 7);
    }

    #[tokio::test]
    async fn receipt_outside_spool_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let queue = SpoolQueue::new(dir.path());
        assert!(queue.ack("../etc/passwd").await.is_err());
    }
}
