//! Push-event correlation.
//!
//! Inbound messages are matched to active upload batches by correlation
//! id. Events for unknown batches belong to another session or tab and
//! are dropped silently; unknown event types are ignored for forward
//! compatibility. Nothing here touches the network.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use serde_json::Value;

use crate::models::{EntityId, UploadStatus};
use crate::store::EntityStore;
use crate::upload::BatchTracker;

/// Wire shape of a push message: `{type, timestamp, data}`, all optional.
#[derive(Debug, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// What handling one message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// Event applied; `refresh` lists file ids whose server-side records
    /// (labels, URLs) are worth re-fetching.
    Applied { refresh: Vec<String> },
    /// Correlation miss or unknown event type; dropped by design.
    Ignored,
    /// Not JSON; logged and discarded.
    Malformed,
}

pub struct EventCorrelator {
    store: Arc<Mutex<EntityStore>>,
    tracker: Arc<Mutex<BatchTracker>>,
}

impl EventCorrelator {
    pub fn new(store: Arc<Mutex<EntityStore>>, tracker: Arc<Mutex<BatchTracker>>) -> Self {
        Self { store, tracker }
    }

    fn lock_store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().expect("entity store mutex poisoned")
    }

    fn lock_tracker(&self) -> MutexGuard<'_, BatchTracker> {
        self.tracker.lock().expect("batch tracker mutex poisoned")
    }

    pub fn handle_raw(&self, text: &str) -> CorrelationOutcome {
        let message: PushMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!("discarding malformed push message: {}", err);
                return CorrelationOutcome::Malformed;
            }
        };
        self.handle(&message)
    }

    pub fn handle(&self, message: &PushMessage) -> CorrelationOutcome {
        let Some(event_type) = message.event_type.as_deref() else {
            return CorrelationOutcome::Ignored;
        };
        let Some(batch_id) = message.data.get("batchId").and_then(Value::as_str) else {
            return CorrelationOutcome::Ignored;
        };

        if event_type == "batch_completed" {
            // idempotent: untracking an already-untracked batch is a no-op
            let removed = self.lock_tracker().untrack(batch_id);
            if removed {
                tracing::info!("batch completed: id={}", batch_id);
            }
            return CorrelationOutcome::Applied { refresh: Vec::new() };
        }

        if !self.lock_tracker().is_active(batch_id) {
            tracing::debug!(
                "push event for unknown batch ignored: id={}, type={}",
                batch_id,
                event_type
            );
            return CorrelationOutcome::Ignored;
        }

        let Some(file_id) = message
            .data
            .get("itemId")
            .or_else(|| message.data.get("fileId"))
            .and_then(Value::as_str)
        else {
            return CorrelationOutcome::Ignored;
        };
        let success = event_success(&message.data);

        let (status, refresh) = match event_type {
            "file_processed" => {
                if success {
                    (UploadStatus::Processed, vec![file_id.to_string()])
                } else {
                    (UploadStatus::Error, Vec::new())
                }
            }
            "analysis_completed" => {
                if success {
                    (UploadStatus::Analyzed, vec![file_id.to_string()])
                } else {
                    (UploadStatus::Error, Vec::new())
                }
            }
            "file_uploaded" | "analysis_started" | "file_analysis_queued" => {
                (UploadStatus::Uploaded, Vec::new())
            }
            other => {
                tracing::debug!("ignoring unknown push event type: {}", other);
                return CorrelationOutcome::Ignored;
            }
        };

        let error = (!success).then(|| format!("{event_type} reported failure"));
        self.lock_tracker()
            .advance(batch_id, file_id, status, error);
        let id = EntityId::committed(file_id);
        if let Some(photo) = self.lock_store().photo_mut(&id) {
            if photo.status.can_advance_to(status) {
                photo.status = status;
            }
        }

        CorrelationOutcome::Applied { refresh }
    }
}

/// The success field arrives either as a boolean flag or as a string
/// status; absence means success (events are confirmations by default).
fn event_success(data: &Value) -> bool {
    if let Some(flag) = data.get("success").and_then(Value::as_bool) {
        return flag;
    }
    if let Some(status) = data.get("status").and_then(Value::as_str) {
        return matches!(
            status.to_ascii_lowercase().as_str(),
            "success" | "succeeded" | "completed" | "ok"
        );
    }
    true
}
