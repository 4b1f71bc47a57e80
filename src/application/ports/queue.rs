//! Message queue port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::WorkMessage;

/// Queue errors
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Failed to receive messages: {0}")]
    ReceiveFailed(String),

    #[error("Failed to acknowledge message: {0}")]
    AckFailed(String),
}

/// A received message plus the handle used to acknowledge it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub receipt: String,
    pub message: WorkMessage,
}

/// Port for the at-least-once work queue.
///
/// No ordering guarantee; a message may be delivered more than once.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, message: &WorkMessage) -> Result<(), QueueError>;

    /// Receive up to `max` messages without removing them.
    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, QueueError>;

    /// Remove a delivered message. Acknowledging twice succeeds.
    async fn ack(&self, receipt: &str) -> Result<(), QueueError>;
}
