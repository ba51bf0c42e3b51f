use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Organizational container. The `item_ids`/`photo_ids` lists are derived
/// aggregates kept for rendering; the authoritative room reference lives
/// on each Item and Photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: EntityId,
    pub name: String,
    pub item_ids: Vec<EntityId>,
    /// Unassigned-to-item photos directly in this room.
    pub photo_ids: Vec<EntityId>,
}

impl Room {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            item_ids: Vec::new(),
            photo_ids: Vec::new(),
        }
    }
}
