use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Tagged entity identifier. Entities are created client-side with a
/// `Pending` id for instant feedback and rewritten to `Committed` once
/// the server assigns the real one. Pending ids must never reach the
/// wire; the mutation executor enforces that.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Pending(String),
    Committed(String),
}

// Both variants serialize to a bare string, so an id read back from the
// wire is always server-issued.
impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(EntityId::Committed(String::deserialize(deserializer)?))
    }
}

impl EntityId {
    /// New client-generated pending id.
    pub fn fresh() -> Self {
        EntityId::Pending(Uuid::new_v4().to_string())
    }

    pub fn committed(id: impl Into<String>) -> Self {
        EntityId::Committed(id.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EntityId::Pending(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Pending(s) | EntityId::Committed(s) => s,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
