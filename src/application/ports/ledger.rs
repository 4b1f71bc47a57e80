//! Work ledger port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::LedgerEntry;

/// Ledger errors
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Ledger read failed: {0}")]
    ReadFailed(String),

    #[error("Ledger write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupt ledger entry: {0}")]
    Corrupt(String),

    #[error("Invalid ledger key: {0}")]
    InvalidKey(String),
}

/// Port for the durable record of outstanding per-segment work.
///
/// An entry's presence means the segment is not clipped yet; absence of
/// all entries for a job is the job's only completion signal.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert or overwrite the entry keyed by `(job_id, index)`.
    async fn put(&self, entry: &LedgerEntry) -> Result<(), LedgerError>;

    /// Look up one entry.
    async fn get(&self, job_id: &str, index: u32) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Remove one entry. Removing an absent entry succeeds.
    async fn delete(&self, job_id: &str, index: u32) -> Result<(), LedgerError>;

    /// Number of outstanding entries for a job.
    async fn count(&self, job_id: &str) -> Result<usize, LedgerError>;
}
