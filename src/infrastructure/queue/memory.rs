//! In-process queue adapter

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{Delivery, MessageQueue, QueueError};
use crate::domain::job::WorkMessage;

/// Queue held in memory. Clones share the same messages.
///
/// Received messages stay queued until acknowledged, so an unacknowledged
/// message is delivered again on the next receive.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    messages: Arc<Mutex<VecDeque<Delivery>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages not yet acknowledged, oldest first
    pub async fn pending(&self) -> Vec<WorkMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, message: &WorkMessage) -> Result<(), QueueError> {
        self.messages.lock().await.push_back(Delivery {
            receipt: uuid::Uuid::new_v4().to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, QueueError> {
        Ok(self.messages.lock().await.iter().take(max).cloned().collect())
    }

    async fn ack(&self, receipt: &str) -> Result<(), QueueError> {
        self.messages.lock().await.retain(|d| d.receipt != receipt);
        Ok(())
    }
}
