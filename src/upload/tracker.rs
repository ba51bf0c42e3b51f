use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{UploadBatch, UploadStatus};

/// Active upload batches, keyed by correlation id. Push events that do
/// not reference a tracked batch belong to another session and are
/// dropped by the correlator. Batches that never see a terminal event
/// are expired by `expire_stale` after a bounded deadline.
#[derive(Debug)]
pub struct BatchTracker {
    batches: HashMap<String, UploadBatch>,
    stale_after: Duration,
}

impl BatchTracker {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            batches: HashMap::new(),
            stale_after,
        }
    }

    pub fn track(&mut self, batch: UploadBatch) {
        tracing::debug!("tracking batch: id={}, files={}", batch.batch_id, batch.files.len());
        self.batches.insert(batch.batch_id.clone(), batch);
    }

    /// Stop tracking. Idempotent; untracking an unknown batch is a no-op.
    pub fn untrack(&mut self, batch_id: &str) -> bool {
        self.batches.remove(batch_id).is_some()
    }

    pub fn is_active(&self, batch_id: &str) -> bool {
        self.batches.contains_key(batch_id)
    }

    pub fn batch(&self, batch_id: &str) -> Option<&UploadBatch> {
        self.batches.get(batch_id)
    }

    /// Advance a file's status, honoring the forward-only state machine.
    /// Returns false when the batch or file is unknown or the transition
    /// would move backwards.
    pub fn advance(
        &mut self,
        batch_id: &str,
        file_id: &str,
        status: UploadStatus,
        error: Option<String>,
    ) -> bool {
        let Some(batch) = self.batches.get_mut(batch_id) else {
            return false;
        };
        let Some(file) = batch.file_mut(file_id) else {
            return false;
        };
        if !file.status.can_advance_to(status) {
            return false;
        }
        file.status = status;
        if error.is_some() {
            file.error = error;
        }
        true
    }

    /// Drop batches older than the stale deadline, returning them with
    /// every still-unfinished file marked as errored.
    pub fn expire_stale(&mut self, now: DateTime<Utc>) -> Vec<UploadBatch> {
        let deadline = chrono::Duration::from_std(self.stale_after)
            .unwrap_or_else(|_| chrono::Duration::seconds(600));
        let expired_ids: Vec<String> = self
            .batches
            .values()
            .filter(|b| now - b.started_at > deadline)
            .map(|b| b.batch_id.clone())
            .collect();
        let mut expired = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            tracing::warn!("expiring stale upload batch: id={}", id);
            let Some(mut batch) = self.batches.remove(&id) else {
                continue;
            };
            for file in &mut batch.files {
                if !file.status.is_terminal() && file.status != UploadStatus::Error {
                    file.status = UploadStatus::Error;
                    file.error = Some("no completion event before expiry".to_string());
                }
            }
            expired.push(batch);
        }
        expired
    }
}
