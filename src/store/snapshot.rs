//! Per-entity snapshot slices for optimistic rollback.
//!
//! A snapshot captures only the entities a mutation touches, each with
//! its prior value and position. Restoring reinstates exactly those
//! slices, so rolling back one failed mutation cannot clobber unrelated
//! mutations that landed in the meantime.

use crate::models::{EntityId, Item, Photo, Room};

use super::EntityStore;

/// Reference to one entity a mutation is about to touch.
#[derive(Debug, Clone)]
pub enum EntityRef {
    Photo(EntityId),
    Item(EntityId),
    Room(EntityId),
}

#[derive(Debug, Clone)]
enum PriorState {
    Photo {
        id: EntityId,
        index: usize,
        prior: Option<Photo>,
    },
    Item {
        id: EntityId,
        index: usize,
        prior: Option<Item>,
    },
    Room {
        id: EntityId,
        index: usize,
        prior: Option<Room>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<PriorState>,
}

impl Snapshot {
    /// Capture the current state of the referenced entities. Entities
    /// absent at capture time are recorded as such; restoring removes
    /// them again if the mutation created them.
    pub fn capture(store: &EntityStore, refs: &[EntityRef]) -> Self {
        let mut entries = Vec::with_capacity(refs.len());
        for r in refs {
            match r {
                EntityRef::Photo(id) => {
                    let index = store.photo_index(id);
                    entries.push(PriorState::Photo {
                        id: id.clone(),
                        index: index.unwrap_or(usize::MAX),
                        prior: index.map(|i| store.photos()[i].clone()),
                    });
                }
                EntityRef::Item(id) => {
                    let index = store.item_index(id);
                    entries.push(PriorState::Item {
                        id: id.clone(),
                        index: index.unwrap_or(usize::MAX),
                        prior: index.map(|i| store.items()[i].clone()),
                    });
                }
                EntityRef::Room(id) => {
                    let index = store.rooms().iter().position(|room| &room.id == id);
                    entries.push(PriorState::Room {
                        id: id.clone(),
                        index: index.unwrap_or(usize::MAX),
                        prior: index.map(|i| store.rooms()[i].clone()),
                    });
                }
            }
        }
        Self { entries }
    }
}

impl EntityStore {
    /// Restore the slices a snapshot captured, leaving everything else
    /// untouched.
    pub fn restore(&mut self, snapshot: Snapshot) {
        for entry in snapshot.entries.into_iter().rev() {
            match entry {
                PriorState::Photo { id, index, prior } => match prior {
                    Some(photo) => {
                        if let Some(slot) = self.photo_mut(&id) {
                            *slot = photo;
                        } else {
                            let photos_len = self.photos().len();
                            let at = index.min(photos_len);
                            self.insert_photo_at(at, photo);
                        }
                    }
                    None => {
                        self.remove_photo_record(&id);
                    }
                },
                PriorState::Item { id, index, prior } => match prior {
                    Some(item) => {
                        if self.item_index(&id).is_some() {
                            if let Some(slot) = self.item_mut(&id) {
                                *slot = item;
                            }
                        } else {
                            let items_len = self.items().len();
                            let at = index.min(items_len);
                            self.insert_item_at(at, item);
                        }
                    }
                    None => {
                        self.remove_item_record(&id);
                    }
                },
                PriorState::Room { id, index, prior } => match prior {
                    Some(room) => {
                        if let Some(slot) = self.room_mut(&id) {
                            *slot = room;
                        } else {
                            let rooms_len = self.rooms().len();
                            let at = index.min(rooms_len);
                            self.insert_room_at(at, room);
                        }
                    }
                    None => {
                        self.remove_room_record(&id);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemPatch;

    #[test]
    fn test_restore_reverts_field_edit_exactly() {
        let mut store = EntityStore::new();
        let id = EntityId::committed("i1");
        let mut original = Item::new(id.clone(), "lamp");
        original.description = "brass floor lamp".to_string();
        store.insert_item(original.clone());

        let snapshot = Snapshot::capture(&store, &[EntityRef::Item(id.clone())]);
        let patch = ItemPatch {
            name: Some("LAMP EDITED".to_string()),
            unit_cost: Some(120.0),
            ..ItemPatch::default()
        };
        store.item_mut(&id).unwrap().apply_patch(&patch);

        store.restore(snapshot);

        let restored = store.item(&id).unwrap();
        assert_eq!(restored.name, original.name);
        assert_eq!(restored.description, original.description);
        assert_eq!(restored.attributes, original.attributes);
    }

    #[test]
    fn test_restore_removes_entity_created_by_mutation() {
        let mut store = EntityStore::new();
        let id = EntityId::fresh();
        let snapshot = Snapshot::capture(&store, &[EntityRef::Item(id.clone())]);
        store.insert_item(Item::new(id.clone(), "ghost"));

        store.restore(snapshot);
        assert!(store.item(&id).is_none());
    }

    #[test]
    fn test_restore_reinstates_deleted_entity_at_position() {
        let mut store = EntityStore::new();
        store.insert_photo(Photo::new(EntityId::committed("p1"), "a.jpg"));
        store.insert_photo(Photo::new(EntityId::committed("p2"), "b.jpg"));
        store.insert_photo(Photo::new(EntityId::committed("p3"), "c.jpg"));

        let id = EntityId::committed("p2");
        let snapshot = Snapshot::capture(&store, &[EntityRef::Photo(id.clone())]);
        store.remove_photo(&id);
        assert_eq!(store.photos().len(), 2);

        store.restore(snapshot);
        assert_eq!(store.photos().len(), 3);
        assert_eq!(store.photos()[1].id, id);
    }

    #[test]
    fn test_restore_leaves_unrelated_entities_alone() {
        let mut store = EntityStore::new();
        store.insert_item(Item::new(EntityId::committed("i1"), "one"));
        store.insert_item(Item::new(EntityId::committed("i2"), "two"));

        let snapshot = Snapshot::capture(&store, &[EntityRef::Item(EntityId::committed("i1"))]);
        store
            .item_mut(&EntityId::committed("i1"))
            .unwrap()
            .name = "one edited".to_string();
        // concurrent unrelated mutation
        store
            .item_mut(&EntityId::committed("i2"))
            .unwrap()
            .name = "two edited".to_string();

        store.restore(snapshot);
        assert_eq!(store.item(&EntityId::committed("i1")).unwrap().name, "one");
        assert_eq!(
            store.item(&EntityId::committed("i2")).unwrap().name,
            "two edited"
        );
    }
}
