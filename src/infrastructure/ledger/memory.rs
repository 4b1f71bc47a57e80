//! In-process ledger adapter

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{Ledger, LedgerError};
use crate::domain::job::LedgerEntry;

/// Ledger held in memory. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    entries: Arc<Mutex<BTreeMap<(String, u32), LedgerEntry>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all jobs
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn put(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .await
            .insert((entry.job_id.clone(), entry.index), entry.clone());
        Ok(())
    }

    async fn get(&self, job_id: &str, index: u32) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .await
            .get(&(job_id.to_string(), index))
            .cloned())
    }

    async fn delete(&self, job_id: &str, index: u32) -> Result<(), LedgerError> {
        self.entries.lock().await.remove(&(job_id.to_string(), index));
        Ok(())
    }

    async fn count(&self, job_id: &str) -> Result<usize, LedgerError> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|(job, _)| job == job_id)
            .count())
    }
}
