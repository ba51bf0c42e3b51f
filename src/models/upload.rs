use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-file lifecycle. Forward-only:
/// pending → uploading → uploaded → {processed|error} → {analyzed|skipped_analysis};
/// a processing `error` can still be followed by an analysis outcome.
/// `failed` is reachable from `uploading` on transport error and is
/// terminal (user removes and re-adds the file, no automatic retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Uploaded,
    Processed,
    Analyzed,
    SkippedAnalysis,
    Error,
    Failed,
}

impl UploadStatus {
    fn rank(self) -> u8 {
        match self {
            UploadStatus::Pending => 0,
            UploadStatus::Uploading => 1,
            UploadStatus::Uploaded => 2,
            UploadStatus::Processed | UploadStatus::Error => 3,
            UploadStatus::Analyzed | UploadStatus::SkippedAnalysis => 4,
            UploadStatus::Failed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UploadStatus::Analyzed | UploadStatus::SkippedAnalysis | UploadStatus::Failed
        )
    }

    /// Whether moving to `next` respects the forward-only state machine.
    /// Terminal statuses never advance.
    pub fn can_advance_to(self, next: UploadStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == UploadStatus::Failed {
            return self == UploadStatus::Uploading;
        }
        next.rank() > self.rank()
    }
}

/// A file picked by the user, held in memory until transferred.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// One member of a tracked upload batch.
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub name: String,
    pub file_id: String,
    pub remote_key: Option<String>,
    pub status: UploadStatus,
    pub error: Option<String>,
}

/// A group of files uploaded together, correlated to push events by
/// `batch_id` until every member reaches a terminal status or the batch
/// is abandoned.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub batch_id: String,
    pub files: Vec<BatchFile>,
    pub started_at: DateTime<Utc>,
}

impl UploadBatch {
    pub fn new(batch_id: impl Into<String>, files: Vec<BatchFile>) -> Self {
        Self {
            batch_id: batch_id.into(),
            files,
            started_at: Utc::now(),
        }
    }

    pub fn file_mut(&mut self, file_id: &str) -> Option<&mut BatchFile> {
        self.files.iter_mut().find(|f| f.file_id == file_id)
    }

    pub fn is_settled(&self) -> bool {
        self.files.iter().all(|f| f.status.is_terminal())
    }
}
