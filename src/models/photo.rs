use serde::{Deserialize, Serialize};

use super::id::EntityId;
use super::upload::UploadStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: EntityId,
    /// Storage URL, null until the backend resolves one.
    pub url: Option<String>,
    pub file_name: String,
    /// AI-derived or manual labels, in display order.
    pub labels: Vec<String>,
    pub item_id: Option<EntityId>,
    pub room_id: Option<EntityId>,
    pub status: UploadStatus,
}

impl Photo {
    pub fn new(id: EntityId, file_name: impl Into<String>) -> Self {
        Self {
            id,
            url: None,
            file_name: file_name.into(),
            labels: Vec::new(),
            item_id: None,
            room_id: None,
            status: UploadStatus::Pending,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.item_id.is_none()
    }

    /// Case-insensitive substring match over the labels.
    pub fn matches_label(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.labels
            .iter()
            .any(|label| label.to_lowercase().contains(&query))
    }
}
