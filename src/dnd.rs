//! Drop resolution for drag-and-drop, independent of any UI event system.
//!
//! The UI renders filtered subsets (unassigned photos, one room's items),
//! so a drop position within the rendered rail has to be translated into
//! an insertion index in the full backing collection. Everything here is
//! pure; the adapter feeds the resulting [`DropEffect`] to the store (for
//! visual reorders) or the executor (for ownership changes).

use crate::models::{EntityId, Photo};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Photo,
    Item,
}

#[derive(Debug, Clone)]
pub struct DragSource {
    pub kind: DragKind,
    pub id: EntityId,
}

/// Which rendered subset a rail position refers to.
#[derive(Debug, Clone)]
pub enum RailScope {
    UnassignedPhotos,
    PhotosInRoom(Option<EntityId>),
    AllItems,
    ItemsInRoom(Option<EntityId>),
}

#[derive(Debug, Clone)]
pub enum DropTarget {
    Photo(EntityId),
    Item(EntityId),
    /// Room button; `None` is the "no room" bucket.
    Room(Option<EntityId>),
    /// A slot between cards in a rendered rail.
    RailSlot {
        scope: RailScope,
        visible_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEffect {
    None,
    SwapPhotos { a: EntityId, b: EntityId },
    SwapItems { a: EntityId, b: EntityId },
    ReorderPhoto { photo_id: EntityId, absolute_index: usize },
    ReorderItem { item_id: EntityId, absolute_index: usize },
    AttachPhotoToItem { photo_id: EntityId, item_id: EntityId },
    MovePhotoToRoom { photo_id: EntityId, room_id: Option<EntityId> },
    MoveItemToRoom { item_id: EntityId, room_id: Option<EntityId> },
    /// Two unassigned photos combined into a fresh item.
    SeedItemFromPhotos { first: EntityId, second: EntityId },
}

/// Translate a drop position within a filtered subset into an insertion
/// index in the full collection. `visible_index` counts only members the
/// predicate accepts; dropping past the end of the subset inserts after
/// the last qualifying member.
pub fn absolute_insert_index<T>(
    collection: &[T],
    matches: impl Fn(&T) -> bool,
    visible_index: usize,
) -> usize {
    let mut seen = 0usize;
    let mut last_match_end = None;
    for (absolute, entry) in collection.iter().enumerate() {
        if matches(entry) {
            if seen == visible_index {
                return absolute;
            }
            seen += 1;
            last_match_end = Some(absolute + 1);
        }
    }
    last_match_end.unwrap_or(collection.len())
}

/// Resolve a drop into its effect. `combine` distinguishes the two
/// readings of photo-on-photo: reorder siblings, or seed a new item from
/// the pair. Self-drops are no-ops.
pub fn resolve_drop(
    store: &EntityStore,
    source: &DragSource,
    target: &DropTarget,
    combine: bool,
) -> DropEffect {
    match (source.kind, target) {
        (_, DropTarget::Photo(target_id)) | (_, DropTarget::Item(target_id))
            if *target_id == source.id =>
        {
            DropEffect::None
        }

        (DragKind::Photo, DropTarget::Photo(target_id)) => {
            let Some(target_photo) = store.photo(target_id) else {
                return DropEffect::None;
            };
            if combine {
                match &target_photo.item_id {
                    // dropping onto an assigned photo joins its item
                    Some(item_id) => DropEffect::AttachPhotoToItem {
                        photo_id: source.id.clone(),
                        item_id: item_id.clone(),
                    },
                    None => DropEffect::SeedItemFromPhotos {
                        first: target_id.clone(),
                        second: source.id.clone(),
                    },
                }
            } else {
                DropEffect::SwapPhotos {
                    a: source.id.clone(),
                    b: target_id.clone(),
                }
            }
        }

        (DragKind::Photo, DropTarget::Item(item_id)) => DropEffect::AttachPhotoToItem {
            photo_id: source.id.clone(),
            item_id: item_id.clone(),
        },

        (DragKind::Photo, DropTarget::Room(room_id)) => {
            match store.photo(&source.id) {
                // room moves apply to unassigned photos only; photos in an
                // item follow the item's room
                Some(photo) if photo.is_unassigned() => DropEffect::MovePhotoToRoom {
                    photo_id: source.id.clone(),
                    room_id: room_id.clone(),
                },
                _ => DropEffect::None,
            }
        }

        (DragKind::Photo, DropTarget::RailSlot { scope, visible_index }) => {
            let predicate: Box<dyn Fn(&Photo) -> bool> = match scope {
                RailScope::UnassignedPhotos => Box::new(|p: &Photo| p.is_unassigned()),
                RailScope::PhotosInRoom(room) => {
                    let room = room.clone();
                    Box::new(move |p: &Photo| {
                        p.is_unassigned() && p.room_id.as_ref() == room.as_ref()
                    })
                }
                _ => return DropEffect::None,
            };
            let absolute_index =
                absolute_insert_index(store.photos(), |p| predicate(p), *visible_index);
            DropEffect::ReorderPhoto {
                photo_id: source.id.clone(),
                absolute_index,
            }
        }

        (DragKind::Item, DropTarget::Item(target_id)) => DropEffect::SwapItems {
            a: source.id.clone(),
            b: target_id.clone(),
        },

        (DragKind::Item, DropTarget::Room(room_id)) => DropEffect::MoveItemToRoom {
            item_id: source.id.clone(),
            room_id: room_id.clone(),
        },

        (DragKind::Item, DropTarget::RailSlot { scope, visible_index }) => {
            let absolute_index = match scope {
                RailScope::AllItems => {
                    absolute_insert_index(store.items(), |_| true, *visible_index)
                }
                RailScope::ItemsInRoom(room) => absolute_insert_index(
                    store.items(),
                    |i| i.room_id.as_ref() == room.as_ref(),
                    *visible_index,
                ),
                _ => return DropEffect::None,
            };
            DropEffect::ReorderItem {
                item_id: source.id.clone(),
                absolute_index,
            }
        }

        (DragKind::Item, DropTarget::Photo(_)) => DropEffect::None,
    }
}
