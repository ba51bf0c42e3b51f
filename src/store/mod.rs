//! In-memory model of Photos, Items and Rooms for one claim.
//!
//! The store owns the three ordered collections and exposes a narrow
//! command API plus pure selectors. Consumers never splice the
//! collections directly; every mutation goes through a command so the
//! cross-reference invariants (photo↔item membership, room propagation,
//! thumbnail membership) hold after each call.

mod snapshot;

pub use snapshot::{EntityRef, Snapshot};

use crate::models::{EntityId, Item, Photo, Room};

#[derive(Debug, Default)]
pub struct EntityStore {
    photos: Vec<Photo>,
    items: Vec<Item>,
    rooms: Vec<Room>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- read access -------------------------------------------------

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn photo(&self, id: &EntityId) -> Option<&Photo> {
        self.photos.iter().find(|p| &p.id == id)
    }

    pub fn item(&self, id: &EntityId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn room(&self, id: &EntityId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub(crate) fn photo_mut(&mut self, id: &EntityId) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|p| &p.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: &EntityId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    pub(crate) fn room_mut(&mut self, id: &EntityId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| &r.id == id)
    }

    pub fn photo_index(&self, id: &EntityId) -> Option<usize> {
        self.photos.iter().position(|p| &p.id == id)
    }

    pub fn item_index(&self, id: &EntityId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    // ---- selectors ---------------------------------------------------

    pub fn photos_for_item(&self, item_id: &EntityId) -> Vec<&Photo> {
        let Some(item) = self.item(item_id) else {
            return Vec::new();
        };
        item.photo_ids
            .iter()
            .filter_map(|pid| self.photo(pid))
            .collect()
    }

    pub fn unassigned_photos(&self) -> Vec<&Photo> {
        self.photos.iter().filter(|p| p.is_unassigned()).collect()
    }

    pub fn items_in_room(&self, room_id: Option<&EntityId>) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.room_id.as_ref() == room_id)
            .collect()
    }

    /// Unassigned photos directly in the given room (or outside any room
    /// when `room_id` is `None`).
    pub fn photos_in_room(&self, room_id: Option<&EntityId>) -> Vec<&Photo> {
        self.photos
            .iter()
            .filter(|p| p.is_unassigned() && p.room_id.as_ref() == room_id)
            .collect()
    }

    // ---- commands ----------------------------------------------------

    pub fn insert_photo(&mut self, photo: Photo) {
        if let Some(room_id) = photo.room_id.clone() {
            if photo.item_id.is_none() {
                if let Some(room) = self.room_mut(&room_id) {
                    if !room.photo_ids.contains(&photo.id) {
                        room.photo_ids.push(photo.id.clone());
                    }
                }
            }
        }
        self.photos.push(photo);
    }

    pub fn insert_item(&mut self, item: Item) {
        if let Some(room_id) = item.room_id.clone() {
            if let Some(room) = self.room_mut(&room_id) {
                if !room.item_ids.contains(&item.id) {
                    room.item_ids.push(item.id.clone());
                }
            }
        }
        self.items.push(item);
    }

    pub fn insert_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub fn remove_photo(&mut self, id: &EntityId) -> Option<Photo> {
        let index = self.photo_index(id)?;
        let photo = self.photos.remove(index);
        if let Some(item_id) = &photo.item_id {
            let item_id = item_id.clone();
            self.drop_photo_from_item(&item_id, id);
        }
        for room in &mut self.rooms {
            room.photo_ids.retain(|pid| pid != id);
        }
        Some(photo)
    }

    /// Remove an Item record. Member photos keep whatever item reference
    /// they currently carry; the executor detaches them first (see
    /// `detach_item_photos`) so a concurrent re-render never sees a photo
    /// pointing at a missing item.
    pub fn remove_item(&mut self, id: &EntityId) -> Option<Item> {
        let index = self.items.iter().position(|i| &i.id == id)?;
        let item = self.items.remove(index);
        for room in &mut self.rooms {
            room.item_ids.retain(|iid| iid != id);
        }
        Some(item)
    }

    pub fn remove_room(&mut self, id: &EntityId) -> Option<Room> {
        let index = self.rooms.iter().position(|r| &r.id == id)?;
        let room = self.rooms.remove(index);
        for item in &mut self.items {
            if item.room_id.as_ref() == Some(id) {
                item.room_id = None;
            }
        }
        for photo in &mut self.photos {
            if photo.room_id.as_ref() == Some(id) {
                photo.room_id = None;
            }
        }
        Some(room)
    }

    /// Null out every member photo's item reference, returning the
    /// detached photo ids in membership order.
    pub fn detach_item_photos(&mut self, item_id: &EntityId) -> Vec<EntityId> {
        let photo_ids = match self.item(item_id) {
            Some(item) => item.photo_ids.clone(),
            None => return Vec::new(),
        };
        for pid in &photo_ids {
            if let Some(photo) = self.photo_mut(pid) {
                photo.item_id = None;
            }
        }
        if let Some(item) = self.item_mut(item_id) {
            item.photo_ids.clear();
            item.thumbnail_photo_id = None;
        }
        photo_ids
    }

    /// Associate a photo with an item, keeping both directions of the
    /// link plus the room propagation consistent.
    pub fn link_photo_to_item(&mut self, photo_id: &EntityId, item_id: &EntityId) {
        let Some(item_room) = self.item(item_id).map(|i| i.room_id.clone()) else {
            return;
        };
        let previous_item = match self.photo_mut(photo_id) {
            Some(photo) => {
                let previous = photo.item_id.take();
                photo.item_id = Some(item_id.clone());
                photo.room_id = item_room;
                previous
            }
            None => return,
        };
        if let Some(previous) = previous_item {
            if &previous != item_id {
                self.drop_photo_from_item(&previous, photo_id);
            }
        }
        for room in &mut self.rooms {
            room.photo_ids.retain(|pid| pid != photo_id);
        }
        if let Some(item) = self.item_mut(item_id) {
            if !item.photo_ids.contains(photo_id) {
                item.photo_ids.push(photo_id.clone());
            }
            if item.thumbnail_photo_id.is_none() {
                item.thumbnail_photo_id = Some(photo_id.clone());
            }
        }
    }

    /// Break a photo→item association. Returns how many photos the item
    /// still holds, so the caller can decide whether the item must go.
    pub fn unlink_photo_from_item(&mut self, photo_id: &EntityId) -> Option<usize> {
        let item_id = self.photo(photo_id)?.item_id.clone()?;
        if let Some(photo) = self.photo_mut(photo_id) {
            photo.item_id = None;
        }
        self.drop_photo_from_item(&item_id, photo_id);
        self.item(&item_id).map(|i| i.photo_ids.len())
    }

    /// Move an item into a room (or out of any room), propagating the
    /// room reference to every member photo.
    pub fn set_item_room(&mut self, item_id: &EntityId, room_id: Option<EntityId>) {
        let member_photos = match self.item_mut(item_id) {
            Some(item) => {
                item.room_id = room_id.clone();
                item.photo_ids.clone()
            }
            None => return,
        };
        for room in &mut self.rooms {
            room.item_ids.retain(|iid| iid != item_id);
        }
        if let Some(rid) = &room_id {
            if let Some(room) = self.room_mut(rid) {
                room.item_ids.push(item_id.clone());
            }
        }
        for pid in &member_photos {
            if let Some(photo) = self.photo_mut(pid) {
                photo.room_id = room_id.clone();
            }
        }
    }

    /// Move an unassigned photo into a room (or out of any room).
    pub fn set_photo_room(&mut self, photo_id: &EntityId, room_id: Option<EntityId>) {
        match self.photo_mut(photo_id) {
            Some(photo) => photo.room_id = room_id.clone(),
            None => return,
        }
        for room in &mut self.rooms {
            room.photo_ids.retain(|pid| pid != photo_id);
        }
        if let Some(rid) = &room_id {
            if let Some(room) = self.room_mut(rid) {
                room.photo_ids.push(photo_id.clone());
            }
        }
    }

    pub fn swap_photos(&mut self, a: &EntityId, b: &EntityId) {
        if let (Some(ia), Some(ib)) = (self.photo_index(a), self.photo_index(b)) {
            self.photos.swap(ia, ib);
        }
    }

    pub fn swap_items(&mut self, a: &EntityId, b: &EntityId) {
        if let (Some(ia), Some(ib)) = (self.item_index(a), self.item_index(b)) {
            self.items.swap(ia, ib);
        }
    }

    /// Reinsert a photo at an absolute position in the backing collection.
    pub fn reposition_photo(&mut self, id: &EntityId, absolute_index: usize) {
        if let Some(current) = self.photo_index(id) {
            let photo = self.photos.remove(current);
            let target = absolute_index.min(self.photos.len());
            self.photos.insert(target, photo);
        }
    }

    pub fn reposition_item(&mut self, id: &EntityId, absolute_index: usize) {
        if let Some(current) = self.item_index(id) {
            let item = self.items.remove(current);
            let target = absolute_index.min(self.items.len());
            self.items.insert(target, item);
        }
    }

    // ---- id reconciliation -------------------------------------------

    /// Replace a pending item id with the server-issued one everywhere it
    /// is referenced: the item itself, photo item refs, room aggregates.
    pub fn commit_item_id(&mut self, pending: &EntityId, committed: EntityId) {
        if let Some(item) = self.item_mut(pending) {
            item.id = committed.clone();
        }
        for photo in &mut self.photos {
            if photo.item_id.as_ref() == Some(pending) {
                photo.item_id = Some(committed.clone());
            }
        }
        for room in &mut self.rooms {
            for iid in &mut room.item_ids {
                if iid == pending {
                    *iid = committed.clone();
                }
            }
        }
    }

    /// Replace a pending photo id everywhere: the photo itself, item
    /// photo lists and thumbnails, room aggregates.
    pub fn commit_photo_id(&mut self, pending: &EntityId, committed: EntityId) {
        if let Some(photo) = self.photo_mut(pending) {
            photo.id = committed.clone();
        }
        for item in &mut self.items {
            for pid in &mut item.photo_ids {
                if pid == pending {
                    *pid = committed.clone();
                }
            }
            if item.thumbnail_photo_id.as_ref() == Some(pending) {
                item.thumbnail_photo_id = Some(committed.clone());
            }
        }
        for room in &mut self.rooms {
            for pid in &mut room.photo_ids {
                if pid == pending {
                    *pid = committed.clone();
                }
            }
        }
    }

    pub fn commit_room_id(&mut self, pending: &EntityId, committed: EntityId) {
        if let Some(room) = self.room_mut(pending) {
            room.id = committed.clone();
        }
        for item in &mut self.items {
            if item.room_id.as_ref() == Some(pending) {
                item.room_id = Some(committed.clone());
            }
        }
        for photo in &mut self.photos {
            if photo.room_id.as_ref() == Some(pending) {
                photo.room_id = Some(committed.clone());
            }
        }
    }

    // ---- internal ----------------------------------------------------

    // Raw record operations used by snapshot restore, which reinstates
    // captured state verbatim and must bypass invariant maintenance.

    pub(crate) fn insert_photo_at(&mut self, index: usize, photo: Photo) {
        self.photos.insert(index, photo);
    }

    pub(crate) fn insert_item_at(&mut self, index: usize, item: Item) {
        self.items.insert(index, item);
    }

    pub(crate) fn insert_room_at(&mut self, index: usize, room: Room) {
        self.rooms.insert(index, room);
    }

    pub(crate) fn remove_photo_record(&mut self, id: &EntityId) {
        self.photos.retain(|p| &p.id != id);
    }

    pub(crate) fn remove_item_record(&mut self, id: &EntityId) {
        self.items.retain(|i| &i.id != id);
    }

    pub(crate) fn remove_room_record(&mut self, id: &EntityId) {
        self.rooms.retain(|r| &r.id != id);
    }

    fn drop_photo_from_item(&mut self, item_id: &EntityId, photo_id: &EntityId) {
        if let Some(item) = self.item_mut(item_id) {
            item.photo_ids.retain(|pid| pid != photo_id);
            if item.thumbnail_photo_id.as_ref() == Some(photo_id) {
                item.thumbnail_photo_id = item.photo_ids.first().cloned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;

    fn photo(id: &str) -> Photo {
        Photo::new(EntityId::committed(id), format!("{id}.jpg"))
    }

    fn item(id: &str) -> Item {
        Item::new(EntityId::committed(id), format!("item {id}"))
    }

    #[test]
    fn test_link_photo_sets_both_directions_and_thumbnail() {
        let mut store = EntityStore::new();
        store.insert_photo(photo("p1"));
        store.insert_item(item("i1"));

        store.link_photo_to_item(&EntityId::committed("p1"), &EntityId::committed("i1"));

        let item = store.item(&EntityId::committed("i1")).unwrap();
        assert_eq!(item.photo_ids, vec![EntityId::committed("p1")]);
        assert_eq!(item.thumbnail_photo_id, Some(EntityId::committed("p1")));
        let photo = store.photo(&EntityId::committed("p1")).unwrap();
        assert_eq!(photo.item_id, Some(EntityId::committed("i1")));
    }

    #[test]
    fn test_thumbnail_stays_member_of_photo_list() {
        let mut store = EntityStore::new();
        store.insert_photo(photo("p1"));
        store.insert_photo(photo("p2"));
        store.insert_item(item("i1"));
        store.link_photo_to_item(&EntityId::committed("p1"), &EntityId::committed("i1"));
        store.link_photo_to_item(&EntityId::committed("p2"), &EntityId::committed("i1"));

        store.unlink_photo_from_item(&EntityId::committed("p1"));

        let item = store.item(&EntityId::committed("i1")).unwrap();
        assert_eq!(item.thumbnail_photo_id, Some(EntityId::committed("p2")));
        assert!(item
            .thumbnail_photo_id
            .as_ref()
            .map(|t| item.photo_ids.contains(t))
            .unwrap_or(true));
    }

    #[test]
    fn test_unlink_last_photo_reports_empty_item() {
        let mut store = EntityStore::new();
        store.insert_photo(photo("p1"));
        store.insert_item(item("i1"));
        store.link_photo_to_item(&EntityId::committed("p1"), &EntityId::committed("i1"));

        let remaining = store.unlink_photo_from_item(&EntityId::committed("p1"));
        assert_eq!(remaining, Some(0));
        let item = store.item(&EntityId::committed("i1")).unwrap();
        assert_eq!(item.thumbnail_photo_id, None);
    }

    #[test]
    fn test_item_room_move_propagates_to_member_photos() {
        let mut store = EntityStore::new();
        store.insert_room(Room::new(EntityId::committed("r1"), "Kitchen"));
        store.insert_photo(photo("p1"));
        store.insert_item(item("i1"));
        store.link_photo_to_item(&EntityId::committed("p1"), &EntityId::committed("i1"));

        store.set_item_room(&EntityId::committed("i1"), Some(EntityId::committed("r1")));

        assert_eq!(
            store.photo(&EntityId::committed("p1")).unwrap().room_id,
            Some(EntityId::committed("r1"))
        );
        assert_eq!(
            store.room(&EntityId::committed("r1")).unwrap().item_ids,
            vec![EntityId::committed("i1")]
        );
    }

    #[test]
    fn test_remove_room_clears_references() {
        let mut store = EntityStore::new();
        store.insert_room(Room::new(EntityId::committed("r1"), "Garage"));
        store.insert_item(item("i1"));
        store.set_item_room(&EntityId::committed("i1"), Some(EntityId::committed("r1")));

        store.remove_room(&EntityId::committed("r1"));

        assert_eq!(store.item(&EntityId::committed("i1")).unwrap().room_id, None);
    }

    #[test]
    fn test_commit_item_id_rewrites_every_reference() {
        let mut store = EntityStore::new();
        let pending = EntityId::fresh();
        store.insert_room(Room::new(EntityId::committed("r1"), "Den"));
        store.insert_photo(photo("p1"));
        store.insert_item(Item::new(pending.clone(), "couch"));
        store.link_photo_to_item(&EntityId::committed("p1"), &pending);
        store.set_item_room(&pending, Some(EntityId::committed("r1")));

        store.commit_item_id(&pending, EntityId::committed("item-42"));

        assert!(store.item(&pending).is_none());
        assert!(store.item(&EntityId::committed("item-42")).is_some());
        assert_eq!(
            store.photo(&EntityId::committed("p1")).unwrap().item_id,
            Some(EntityId::committed("item-42"))
        );
        assert_eq!(
            store.room(&EntityId::committed("r1")).unwrap().item_ids,
            vec![EntityId::committed("item-42")]
        );
        // no residual pending references anywhere
        assert!(!store
            .photos()
            .iter()
            .any(|p| p.item_id.as_ref() == Some(&pending)));
    }

    #[test]
    fn test_selectors_partition_by_room_and_assignment() {
        let mut store = EntityStore::new();
        store.insert_room(Room::new(EntityId::committed("r1"), "Attic"));
        store.insert_photo(photo("p1"));
        store.insert_photo(photo("p2"));
        store.insert_item(item("i1"));
        store.link_photo_to_item(&EntityId::committed("p1"), &EntityId::committed("i1"));
        store.set_photo_room(&EntityId::committed("p2"), Some(EntityId::committed("r1")));

        assert_eq!(store.unassigned_photos().len(), 1);
        assert_eq!(
            store
                .photos_in_room(Some(&EntityId::committed("r1")))
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>(),
            vec!["p2"]
        );
        assert!(store.photos_in_room(None).is_empty());
    }
}
