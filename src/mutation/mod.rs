//! Optimistic mutation executor.
//!
//! Every workbench mutation follows one protocol: snapshot the affected
//! store slices, apply the change locally, hand a [`MutationHandle`] back
//! to the caller right away, then run the remote leg on a spawned task.
//! Success reconciles pending ids with server-issued ones; failure
//! restores the snapshot and pushes a user-visible notice. The store is
//! never left half-applied.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::api::{AttachFileBody, FilePatch, FileRecord, ItemCreateBody, RemoteStore, RoomCreateBody};
use crate::error::{Notice, WorkbenchError, WorkbenchResult};
use crate::models::{EntityId, Item, ItemPatch, Room};
use crate::store::{EntityRef, EntityStore, Snapshot};

/// Completion handle for the remote leg of a mutation. The local change
/// has already been applied when the handle is returned; awaiting it
/// reports whether the remote store accepted the change (or the rollback
/// that happened instead).
pub struct MutationHandle<T = ()> {
    inner: JoinHandle<WorkbenchResult<T>>,
}

impl<T> MutationHandle<T> {
    fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = WorkbenchResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        Self {
            inner: tokio::spawn(future),
        }
    }

    pub async fn wait(self) -> WorkbenchResult<T> {
        self.inner
            .await
            .map_err(|e| WorkbenchError::Internal(format!("mutation task panicked: {e}")))?
    }
}

/// Photo association requested while its item still has a pending id.
/// Replayed in request order once the server id arrives.
#[derive(Debug, Clone)]
struct QueuedLink {
    photo_id: EntityId,
    seed_labels: Vec<String>,
}

pub struct Executor<R: RemoteStore + 'static> {
    claim_id: String,
    store: Arc<Mutex<EntityStore>>,
    remote: Arc<R>,
    notices: Arc<Mutex<Vec<Notice>>>,
    pending_links: Arc<Mutex<HashMap<EntityId, Vec<QueuedLink>>>>,
    dirty_while_pending: Arc<Mutex<HashSet<EntityId>>>,
    deleted_while_pending: Arc<Mutex<HashSet<EntityId>>>,
    focused_item: Arc<Mutex<Option<EntityId>>>,
}

impl<R: RemoteStore> Clone for Executor<R> {
    fn clone(&self) -> Self {
        Self {
            claim_id: self.claim_id.clone(),
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            notices: Arc::clone(&self.notices),
            pending_links: Arc::clone(&self.pending_links),
            dirty_while_pending: Arc::clone(&self.dirty_while_pending),
            deleted_while_pending: Arc::clone(&self.deleted_while_pending),
            focused_item: Arc::clone(&self.focused_item),
        }
    }
}

impl<R: RemoteStore> Executor<R> {
    pub fn new(claim_id: impl Into<String>, store: Arc<Mutex<EntityStore>>, remote: Arc<R>) -> Self {
        Self {
            claim_id: claim_id.into(),
            store,
            remote,
            notices: Arc::new(Mutex::new(Vec::new())),
            pending_links: Arc::new(Mutex::new(HashMap::new())),
            dirty_while_pending: Arc::new(Mutex::new(HashSet::new())),
            deleted_while_pending: Arc::new(Mutex::new(HashSet::new())),
            focused_item: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> Arc<Mutex<EntityStore>> {
        Arc::clone(&self.store)
    }

    fn lock_store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().expect("entity store mutex poisoned")
    }

    fn push_notice(&self, notice: Notice) {
        tracing::warn!("notice: kind={:?}, message={}", notice.kind, notice.message);
        self.notices
            .lock()
            .expect("notice list mutex poisoned")
            .push(notice);
    }

    /// Drain the user-visible error list.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .expect("notice list mutex poisoned")
            .drain(..)
            .collect()
    }

    pub fn focused_item(&self) -> Option<EntityId> {
        self.focused_item
            .lock()
            .expect("focus mutex poisoned")
            .clone()
    }

    pub fn set_focused_item(&self, item_id: Option<EntityId>) {
        *self.focused_item.lock().expect("focus mutex poisoned") = item_id;
    }

    fn clear_focus_if(&self, item_id: &EntityId) {
        let mut focus = self.focused_item.lock().expect("focus mutex poisoned");
        if focus.as_ref() == Some(item_id) {
            *focus = None;
        }
    }

    fn rollback(&self, snapshot: Snapshot, context: &str, err: &WorkbenchError) {
        tracing::warn!("rolling back {}: {}", context, err);
        self.lock_store().restore(snapshot);
        self.push_notice(Notice::reconciliation(format!("{context} failed: {err}")));
    }

    // ---- create-item -------------------------------------------------

    /// Create an item, optionally in a room and seeded with one photo.
    /// The item appears in the store with a pending id immediately; the
    /// returned id is rewritten in place once the server responds.
    pub fn create_item(
        &self,
        name: impl Into<String>,
        room_id: Option<EntityId>,
        seed_photo: Option<EntityId>,
    ) -> (EntityId, MutationHandle) {
        let name = name.into();
        let pending = EntityId::fresh();

        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Item(pending.clone())];
            if let Some(pid) = &seed_photo {
                refs.push(EntityRef::Photo(pid.clone()));
                // linking moves the photo out of its current item, which
                // loses a member and possibly its thumbnail
                if let Some(previous) = store.photo(pid).and_then(|p| p.item_id.clone()) {
                    refs.push(EntityRef::Item(previous));
                }
            }
            if let Some(rid) = &room_id {
                refs.push(EntityRef::Room(rid.clone()));
            }
            Snapshot::capture(&store, &refs)
        };

        {
            let mut store = self.lock_store();
            let mut item = Item::new(pending.clone(), name.clone());
            item.room_id = room_id.clone();
            store.insert_item(item);
            if let Some(pid) = &seed_photo {
                store.link_photo_to_item(pid, &pending);
            }
        }

        let this = self.clone();
        let pending_id = pending.clone();
        let handle = MutationHandle::spawn(async move {
            let body = ItemCreateBody {
                name,
                description: None,
                room_id: room_id.as_ref().and_then(|r| {
                    (!r.is_pending()).then(|| r.as_str().to_string())
                }),
            };
            match this.remote.create_item(&this.claim_id, &body).await {
                Ok(created) => {
                    this.finish_item_create(&pending_id, created.id, seed_photo)
                        .await
                }
                Err(err) => {
                    this.rollback(snapshot, "create item", &err);
                    Err(err)
                }
            }
        });

        (pending, handle)
    }

    /// Post-create reconciliation: rewrite the pending id everywhere,
    /// replay queued associations in request order, flush field edits
    /// made while pending, and honor a delete that raced the create.
    async fn finish_item_create(
        &self,
        pending: &EntityId,
        server_id: String,
        seed_photo: Option<EntityId>,
    ) -> WorkbenchResult<()> {
        let committed = EntityId::committed(server_id);
        let deleted = self
            .deleted_while_pending
            .lock()
            .expect("pending-delete mutex poisoned")
            .remove(pending);

        if deleted {
            // The user deleted the item before the server id existed.
            self.pending_links
                .lock()
                .expect("pending links mutex poisoned")
                .remove(pending);
            tracing::info!("deleting item created-then-deleted: id={}", committed);
            return self.remote.delete_item(committed.as_str()).await;
        }

        self.lock_store().commit_item_id(pending, committed.clone());

        if let Some(pid) = seed_photo {
            if !pid.is_pending() {
                let labels = self
                    .lock_store()
                    .photo(&pid)
                    .map(|p| p.labels.clone())
                    .unwrap_or_default();
                let body = AttachFileBody {
                    file_id: pid.as_str().to_string(),
                    seed_labels: labels,
                };
                if let Err(err) = self.remote.attach_file(committed.as_str(), &body).await {
                    self.push_notice(Notice::transport(format!(
                        "seed photo association failed: {err}"
                    )));
                }
            }
        }

        let queued = self
            .pending_links
            .lock()
            .expect("pending links mutex poisoned")
            .remove(pending)
            .unwrap_or_default();
        for link in queued {
            let body = AttachFileBody {
                file_id: link.photo_id.as_str().to_string(),
                seed_labels: link.seed_labels,
            };
            if let Err(err) = self.remote.attach_file(committed.as_str(), &body).await {
                self.lock_store().unlink_photo_from_item(&link.photo_id);
                self.push_notice(Notice::transport(format!(
                    "queued photo association failed: {err}"
                )));
            }
        }

        let dirty = self
            .dirty_while_pending
            .lock()
            .expect("pending-dirty mutex poisoned")
            .remove(pending);
        if dirty {
            let patch = self
                .lock_store()
                .item(&committed)
                .map(item_to_patch);
            if let Some(patch) = patch {
                if let Err(err) = self.remote.update_item(committed.as_str(), &patch).await {
                    self.push_notice(Notice::transport(format!(
                        "deferred item update failed: {err}"
                    )));
                }
            }
        }

        Ok(())
    }

    // ---- update-item-fields ------------------------------------------

    /// Field-level edit, last writer wins per field. Pending-id items are
    /// edited locally only and flushed after the create resolves.
    pub fn update_item_fields(&self, item_id: &EntityId, patch: ItemPatch) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            Snapshot::capture(&store, &[EntityRef::Item(item_id.clone())])
        };

        {
            let mut store = self.lock_store();
            match store.item_mut(item_id) {
                Some(item) => item.apply_patch(&patch),
                None => {
                    let id = item_id.clone();
                    return MutationHandle::spawn(async move {
                        Err(WorkbenchError::NotFound(format!("item {id}")))
                    });
                }
            }
        }

        if item_id.is_pending() {
            self.dirty_while_pending
                .lock()
                .expect("pending-dirty mutex poisoned")
                .insert(item_id.clone());
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let item_id = item_id.clone();
        MutationHandle::spawn(async move {
            match this.remote.update_item(item_id.as_str(), &patch).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "update item", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- delete-item -------------------------------------------------

    /// Delete an item. Member photos lose their item reference first, so
    /// a concurrent re-render never sees a photo pointing at a removed
    /// item; the record itself goes once the remote call is issued.
    pub fn delete_item(&self, item_id: &EntityId) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Item(item_id.clone())];
            if let Some(item) = store.item(item_id) {
                for pid in &item.photo_ids {
                    refs.push(EntityRef::Photo(pid.clone()));
                }
                if let Some(rid) = &item.room_id {
                    refs.push(EntityRef::Room(rid.clone()));
                }
            }
            Snapshot::capture(&store, &refs)
        };

        {
            let mut store = self.lock_store();
            store.detach_item_photos(item_id);
            store.remove_item(item_id);
        }
        self.clear_focus_if(item_id);

        if item_id.is_pending() {
            self.deleted_while_pending
                .lock()
                .expect("pending-delete mutex poisoned")
                .insert(item_id.clone());
            self.pending_links
                .lock()
                .expect("pending links mutex poisoned")
                .remove(item_id);
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let item_id = item_id.clone();
        MutationHandle::spawn(async move {
            match this.remote.delete_item(item_id.as_str()).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "delete item", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- photo association -------------------------------------------

    /// Associate a photo with an item. Associations against an item whose
    /// server id is not known yet are queued and replayed in order.
    pub fn add_photo_to_item(&self, photo_id: &EntityId, item_id: &EntityId) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![
                EntityRef::Photo(photo_id.clone()),
                EntityRef::Item(item_id.clone()),
            ];
            // linking also edits the photo's current item, which loses a
            // member and possibly its thumbnail
            if let Some(previous) = store.photo(photo_id).and_then(|p| p.item_id.clone()) {
                if &previous != item_id {
                    refs.push(EntityRef::Item(previous));
                }
            }
            Snapshot::capture(&store, &refs)
        };

        let seed_labels = {
            let mut store = self.lock_store();
            if store.item(item_id).is_none() || store.photo(photo_id).is_none() {
                let missing = if store.item(item_id).is_none() {
                    format!("item {item_id}")
                } else {
                    format!("photo {photo_id}")
                };
                return MutationHandle::spawn(async move {
                    Err(WorkbenchError::NotFound(missing))
                });
            }
            store.link_photo_to_item(photo_id, item_id);
            store
                .photo(photo_id)
                .map(|p| p.labels.clone())
                .unwrap_or_default()
        };

        if item_id.is_pending() {
            self.pending_links
                .lock()
                .expect("pending links mutex poisoned")
                .entry(item_id.clone())
                .or_default()
                .push(QueuedLink {
                    photo_id: photo_id.clone(),
                    seed_labels,
                });
            return MutationHandle::spawn(async { Ok(()) });
        }
        if photo_id.is_pending() {
            // Photo has no server id either; nothing to send yet.
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let photo_id = photo_id.clone();
        let item_id = item_id.clone();
        MutationHandle::spawn(async move {
            let body = AttachFileBody {
                file_id: photo_id.as_str().to_string(),
                seed_labels,
            };
            match this.remote.attach_file(item_id.as_str(), &body).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "add photo to item", &err);
                    Err(err)
                }
            }
        })
    }

    /// Remove a photo from its item. Emptying the item's photo list
    /// deletes the item entirely and moves the detail focus away from it.
    pub fn remove_photo_from_item(&self, photo_id: &EntityId) -> MutationHandle {
        let item_id = match self.lock_store().photo(photo_id).and_then(|p| p.item_id.clone()) {
            Some(id) => id,
            None => {
                let id = photo_id.clone();
                return MutationHandle::spawn(async move {
                    Err(WorkbenchError::NotFound(format!("photo {id} has no item")))
                });
            }
        };

        let snapshot = {
            let store = self.lock_store();
            Snapshot::capture(
                &store,
                &[
                    EntityRef::Photo(photo_id.clone()),
                    EntityRef::Item(item_id.clone()),
                ],
            )
        };

        let item_now_empty = {
            let mut store = self.lock_store();
            store.unlink_photo_from_item(photo_id) == Some(0)
        };

        if item_now_empty {
            {
                let mut store = self.lock_store();
                store.remove_item(&item_id);
            }
            self.clear_focus_if(&item_id);
        }

        let this = self.clone();
        let photo_id = photo_id.clone();
        let item_id = item_id.clone();
        MutationHandle::spawn(async move {
            let result: WorkbenchResult<()> = async {
                if !photo_id.is_pending() {
                    let patch = FilePatch {
                        item_id: Some(None),
                        room_id: None,
                    };
                    this.remote.update_file(photo_id.as_str(), &patch).await?;
                }
                if item_now_empty && !item_id.is_pending() {
                    this.remote.delete_item(item_id.as_str()).await?;
                }
                Ok(())
            }
            .await;
            match result {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "remove photo from item", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- delete-photo ------------------------------------------------

    /// Delete a photo outright. An item left with no photos is deleted
    /// rather than kept orphaned.
    pub fn delete_photo(&self, photo_id: &EntityId) -> MutationHandle {
        let item_id = self
            .lock_store()
            .photo(photo_id)
            .and_then(|p| p.item_id.clone());

        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Photo(photo_id.clone())];
            if let Some(iid) = &item_id {
                refs.push(EntityRef::Item(iid.clone()));
            }
            if let Some(photo) = store.photo(photo_id) {
                if let Some(rid) = &photo.room_id {
                    refs.push(EntityRef::Room(rid.clone()));
                }
            }
            Snapshot::capture(&store, &refs)
        };

        let item_now_empty = {
            let mut store = self.lock_store();
            store.remove_photo(photo_id);
            match &item_id {
                Some(iid) => store
                    .item(iid)
                    .map(|i| i.photo_ids.is_empty())
                    .unwrap_or(false),
                None => false,
            }
        };
        if item_now_empty {
            if let Some(iid) = &item_id {
                self.lock_store().remove_item(iid);
                self.clear_focus_if(iid);
            }
        }

        let this = self.clone();
        let photo_id = photo_id.clone();
        MutationHandle::spawn(async move {
            let result: WorkbenchResult<()> = async {
                if !photo_id.is_pending() {
                    this.remote.delete_file(photo_id.as_str()).await?;
                }
                if item_now_empty {
                    if let Some(iid) = &item_id {
                        if !iid.is_pending() {
                            this.remote.delete_item(iid.as_str()).await?;
                        }
                    }
                }
                Ok(())
            }
            .await;
            match result {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "delete photo", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- room moves --------------------------------------------------

    pub fn move_item_to_room(
        &self,
        item_id: &EntityId,
        room_id: Option<EntityId>,
    ) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Item(item_id.clone())];
            if let Some(item) = store.item(item_id) {
                for pid in &item.photo_ids {
                    refs.push(EntityRef::Photo(pid.clone()));
                }
                if let Some(old) = &item.room_id {
                    refs.push(EntityRef::Room(old.clone()));
                }
            }
            if let Some(new) = &room_id {
                refs.push(EntityRef::Room(new.clone()));
            }
            Snapshot::capture(&store, &refs)
        };

        self.lock_store().set_item_room(item_id, room_id.clone());

        // Pending ids on either side stay local; the room-create or
        // item-create reconciliation flushes the reference afterwards.
        if item_id.is_pending() {
            self.dirty_while_pending
                .lock()
                .expect("pending-dirty mutex poisoned")
                .insert(item_id.clone());
            return MutationHandle::spawn(async { Ok(()) });
        }
        if room_id.as_ref().map(|r| r.is_pending()).unwrap_or(false) {
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let item_id = item_id.clone();
        MutationHandle::spawn(async move {
            let room = room_id.as_ref().map(|r| r.as_str().to_string());
            match this.remote.move_item(item_id.as_str(), room.as_deref()).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "move item to room", &err);
                    Err(err)
                }
            }
        })
    }

    pub fn move_photo_to_room(
        &self,
        photo_id: &EntityId,
        room_id: Option<EntityId>,
    ) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Photo(photo_id.clone())];
            if let Some(photo) = store.photo(photo_id) {
                if let Some(old) = &photo.room_id {
                    refs.push(EntityRef::Room(old.clone()));
                }
            }
            if let Some(new) = &room_id {
                refs.push(EntityRef::Room(new.clone()));
            }
            Snapshot::capture(&store, &refs)
        };

        self.lock_store().set_photo_room(photo_id, room_id.clone());

        if photo_id.is_pending()
            || room_id.as_ref().map(|r| r.is_pending()).unwrap_or(false)
        {
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let photo_id = photo_id.clone();
        MutationHandle::spawn(async move {
            let patch = FilePatch {
                item_id: None,
                room_id: Some(room_id.as_ref().map(|r| r.as_str().to_string())),
            };
            match this.remote.update_file(photo_id.as_str(), &patch).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "move photo to room", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- rooms -------------------------------------------------------

    pub fn create_room(&self, name: impl Into<String>) -> (EntityId, MutationHandle) {
        let name = name.into();
        let pending = EntityId::fresh();

        let snapshot = {
            let store = self.lock_store();
            Snapshot::capture(&store, &[EntityRef::Room(pending.clone())])
        };
        self.lock_store()
            .insert_room(Room::new(pending.clone(), name.clone()));

        let this = self.clone();
        let pending_id = pending.clone();
        let handle = MutationHandle::spawn(async move {
            let body = RoomCreateBody { name };
            match this.remote.create_room(&this.claim_id, &body).await {
                Ok(created) => {
                    let committed = EntityId::committed(created.id);
                    this.lock_store()
                        .commit_room_id(&pending_id, committed.clone());
                    this.flush_room_references(&committed).await;
                    Ok(())
                }
                Err(err) => {
                    this.rollback(snapshot, "create room", &err);
                    Err(err)
                }
            }
        });

        (pending, handle)
    }

    /// Entities moved into a room while it was pending never reached the
    /// wire. Once the room id commits, send their moves.
    async fn flush_room_references(&self, room_id: &EntityId) {
        let (item_ids, photo_ids) = {
            let store = self.lock_store();
            let items: Vec<EntityId> = store
                .items_in_room(Some(room_id))
                .iter()
                .filter(|i| !i.id.is_pending())
                .map(|i| i.id.clone())
                .collect();
            let photos: Vec<EntityId> = store
                .photos_in_room(Some(room_id))
                .iter()
                .filter(|p| !p.id.is_pending())
                .map(|p| p.id.clone())
                .collect();
            (items, photos)
        };
        for iid in item_ids {
            if let Err(err) = self
                .remote
                .move_item(iid.as_str(), Some(room_id.as_str()))
                .await
            {
                self.push_notice(Notice::transport(format!(
                    "deferred room move failed for item {iid}: {err}"
                )));
            }
        }
        for pid in photo_ids {
            let patch = FilePatch {
                item_id: None,
                room_id: Some(Some(room_id.as_str().to_string())),
            };
            if let Err(err) = self.remote.update_file(pid.as_str(), &patch).await {
                self.push_notice(Notice::transport(format!(
                    "deferred room move failed for photo {pid}: {err}"
                )));
            }
        }
    }

    pub fn delete_room(&self, room_id: &EntityId) -> MutationHandle {
        let snapshot = {
            let store = self.lock_store();
            let mut refs = vec![EntityRef::Room(room_id.clone())];
            if let Some(room) = store.room(room_id) {
                for iid in &room.item_ids {
                    refs.push(EntityRef::Item(iid.clone()));
                }
                for pid in &room.photo_ids {
                    refs.push(EntityRef::Photo(pid.clone()));
                }
            }
            Snapshot::capture(&store, &refs)
        };

        self.lock_store().remove_room(room_id);

        if room_id.is_pending() {
            return MutationHandle::spawn(async { Ok(()) });
        }

        let this = self.clone();
        let room_id = room_id.clone();
        MutationHandle::spawn(async move {
            match this
                .remote
                .delete_room(&this.claim_id, room_id.as_str())
                .await
            {
                Ok(()) => Ok(()),
                Err(err) => {
                    this.rollback(snapshot, "delete room", &err);
                    Err(err)
                }
            }
        })
    }

    // ---- drag-and-drop -----------------------------------------------

    /// Apply a resolved drop. Visual reorders touch only the store and
    /// never go remote; ownership changes run the optimistic protocol.
    pub fn apply_drop_effect(&self, effect: crate::dnd::DropEffect) -> Option<MutationHandle> {
        use crate::dnd::DropEffect;
        match effect {
            DropEffect::None => None,
            DropEffect::SwapPhotos { a, b } => {
                self.lock_store().swap_photos(&a, &b);
                None
            }
            DropEffect::SwapItems { a, b } => {
                self.lock_store().swap_items(&a, &b);
                None
            }
            DropEffect::ReorderPhoto { photo_id, absolute_index } => {
                self.lock_store().reposition_photo(&photo_id, absolute_index);
                None
            }
            DropEffect::ReorderItem { item_id, absolute_index } => {
                self.lock_store().reposition_item(&item_id, absolute_index);
                None
            }
            DropEffect::AttachPhotoToItem { photo_id, item_id } => {
                Some(self.add_photo_to_item(&photo_id, &item_id))
            }
            DropEffect::MovePhotoToRoom { photo_id, room_id } => {
                Some(self.move_photo_to_room(&photo_id, room_id))
            }
            DropEffect::MoveItemToRoom { item_id, room_id } => {
                Some(self.move_item_to_room(&item_id, room_id))
            }
            DropEffect::SeedItemFromPhotos { first, second } => {
                let room = self
                    .lock_store()
                    .photo(&first)
                    .and_then(|p| p.room_id.clone());
                let (pending, handle) = self.create_item("New item", room, Some(first));
                // queued behind the create; replayed once the id commits
                let _ = self.add_photo_to_item(&second, &pending);
                Some(handle)
            }
        }
    }

    // ---- server-pushed refresh ---------------------------------------

    /// Overlay server-side file records (labels, storage URLs) onto the
    /// local photos. Used after processing events arrive.
    pub fn apply_file_records(&self, records: &[FileRecord]) {
        let mut store = self.lock_store();
        for record in records {
            let id = EntityId::committed(&record.id);
            if let Some(photo) = store.photo_mut(&id) {
                if record.url.is_some() {
                    photo.url = record.url.clone();
                }
                if !record.labels.is_empty() {
                    photo.labels = record.labels.clone();
                }
            }
        }
    }
}

fn item_to_patch(item: &Item) -> ItemPatch {
    ItemPatch {
        name: Some(item.name.clone()),
        description: Some(item.description.clone()),
        unit_cost: item.attributes.unit_cost,
        quantity: item.attributes.quantity,
        brand: item.attributes.brand.clone(),
        model: item.attributes.model.clone(),
        vendor: item.attributes.vendor.clone(),
        age_years: item.attributes.age_years,
        condition: item.attributes.condition.clone(),
    }
}

#[cfg(test)]
mod tests;
