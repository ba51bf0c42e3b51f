use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Optional structured attributes of a claimed possession.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub unit_cost: Option<f64>,
    pub quantity: Option<u32>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub age_years: Option<u32>,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub attributes: ItemAttributes,
    /// Ordered photo membership. The thumbnail, when set, must be one of these.
    pub photo_ids: Vec<EntityId>,
    pub thumbnail_photo_id: Option<EntityId>,
    pub room_id: Option<EntityId>,
}

impl Item {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            attributes: ItemAttributes::default(),
            photo_ids: Vec::new(),
            thumbnail_photo_id: None,
            room_id: None,
        }
    }

    /// Field-level merge for partial edits. Last writer wins per field.
    pub fn apply_patch(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(unit_cost) = patch.unit_cost {
            self.attributes.unit_cost = Some(unit_cost);
        }
        if let Some(quantity) = patch.quantity {
            self.attributes.quantity = Some(quantity);
        }
        if let Some(brand) = &patch.brand {
            self.attributes.brand = Some(brand.clone());
        }
        if let Some(model) = &patch.model {
            self.attributes.model = Some(model.clone());
        }
        if let Some(vendor) = &patch.vendor {
            self.attributes.vendor = Some(vendor.clone());
        }
        if let Some(age_years) = patch.age_years {
            self.attributes.age_years = Some(age_years);
        }
        if let Some(condition) = &patch.condition {
            self.attributes.condition = Some(condition.clone());
        }
    }
}

/// Partial update; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_cost: Option<f64>,
    pub quantity: Option<u32>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub age_years: Option<u32>,
    pub condition: Option<String>,
}
