use std::sync::{Arc, Mutex};

use super::*;
use crate::models::Photo;
use crate::testutil::MockRemote;

fn setup() -> (Executor<MockRemote>, Arc<MockRemote>, Arc<Mutex<EntityStore>>) {
    let store = Arc::new(Mutex::new(EntityStore::new()));
    let remote = Arc::new(MockRemote::new());
    let executor = Executor::new("claim-1", Arc::clone(&store), Arc::clone(&remote));
    (executor, remote, store)
}

fn seed_photo(store: &Arc<Mutex<EntityStore>>, id: &str) -> EntityId {
    let eid = EntityId::committed(id);
    store
        .lock()
        .unwrap()
        .insert_photo(Photo::new(eid.clone(), format!("{id}.jpg")));
    eid
}

#[tokio::test]
async fn test_create_item_reconciles_pending_id_everywhere() {
    let (executor, _remote, store) = setup();
    let photo = seed_photo(&store, "p1");

    let (pending, handle) = executor.create_item("couch", None, Some(photo.clone()));
    {
        let store = store.lock().unwrap();
        let item = store.item(&pending).expect("item appears immediately");
        assert!(item.id.is_pending());
        assert_eq!(item.photo_ids, vec![photo.clone()]);
    }

    handle.wait().await.unwrap();

    let store = store.lock().unwrap();
    assert!(store.item(&pending).is_none());
    let committed = EntityId::committed("item-42");
    let item = store.item(&committed).expect("server id in place");
    assert_eq!(item.photo_ids, vec![photo.clone()]);
    assert_eq!(store.photo(&photo).unwrap().item_id, Some(committed));
    assert!(!store.photos().iter().any(|p| p.item_id.as_ref() == Some(&pending)));
}

#[tokio::test]
async fn test_create_item_with_no_seed_photo_starts_empty() {
    let (executor, _remote, store) = setup();

    let (pending, handle) = executor.create_item("rug", None, None);
    {
        let store = store.lock().unwrap();
        let item = store.item(&pending).unwrap();
        assert!(item.photo_ids.is_empty());
        assert_eq!(item.thumbnail_photo_id, None);
    }
    handle.wait().await.unwrap();
    assert!(store
        .lock()
        .unwrap()
        .item(&EntityId::committed("item-42"))
        .is_some());
}

#[tokio::test]
async fn test_update_rollback_restores_fields_exactly() {
    let (executor, remote, store) = setup();
    let id = EntityId::committed("i1");
    let mut item = Item::new(id.clone(), "lamp");
    item.description = "brass floor lamp".to_string();
    item.attributes.unit_cost = Some(80.0);
    store.lock().unwrap().insert_item(item.clone());
    remote.fail_on("update_item");

    let patch = ItemPatch {
        name: Some("LAMP!".to_string()),
        unit_cost: Some(999.0),
        ..ItemPatch::default()
    };
    let result = executor.update_item_fields(&id, patch).wait().await;
    assert!(result.is_err());

    let store = store.lock().unwrap();
    let after = store.item(&id).unwrap();
    assert_eq!(after.name, item.name);
    assert_eq!(after.description, item.description);
    assert_eq!(after.attributes, item.attributes);
    assert_eq!(executor.take_notices().len(), 1);
}

#[tokio::test]
async fn test_associations_queued_while_pending_replay_in_order() {
    let (executor, remote, store) = setup();
    let p1 = seed_photo(&store, "pa");
    let p2 = seed_photo(&store, "pb");

    let (pending, create) = executor.create_item("dresser", None, None);
    let h1 = executor.add_photo_to_item(&p1, &pending);
    let h2 = executor.add_photo_to_item(&p2, &pending);
    h1.wait().await.unwrap();
    h2.wait().await.unwrap();
    create.wait().await.unwrap();

    let calls = remote.calls();
    assert_eq!(
        calls,
        vec![
            "create_item claim-1 dresser".to_string(),
            "attach_file item-42 pa".to_string(),
            "attach_file item-42 pb".to_string(),
        ]
    );
    // both photos reference the committed id
    let store = store.lock().unwrap();
    assert_eq!(
        store.photo(&p1).unwrap().item_id,
        Some(EntityId::committed("item-42"))
    );
    assert_eq!(
        store.photo(&p2).unwrap().item_id,
        Some(EntityId::committed("item-42"))
    );
}

#[tokio::test]
async fn test_pending_item_edit_never_calls_remote_until_create_resolves() {
    let (executor, remote, _store) = setup();

    let (pending, create) = executor.create_item("bookshelf", None, None);
    let patch = ItemPatch {
        name: Some("oak bookshelf".to_string()),
        ..ItemPatch::default()
    };
    let update = executor.update_item_fields(&pending, patch);
    // local apply is synchronous; no remote traffic has happened yet
    assert!(remote.calls().is_empty());

    create.wait().await.unwrap();
    update.wait().await.unwrap();
    let calls = remote.calls();
    assert_eq!(calls[0], "create_item claim-1 bookshelf");
    assert_eq!(calls[1], "update_item item-42 oak bookshelf");
}

#[tokio::test]
async fn test_attach_rollback_restores_previous_item_links() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_a = EntityId::committed("iA");
    let item_b = EntityId::committed("iB");
    {
        let mut guard = store.lock().unwrap();
        guard.insert_item(Item::new(item_a.clone(), "old home"));
        guard.insert_item(Item::new(item_b.clone(), "new home"));
        guard.link_photo_to_item(&photo, &item_a);
    }
    remote.fail_on("attach_file");

    let result = executor.add_photo_to_item(&photo, &item_b).wait().await;
    assert!(result.is_err());

    // both directions of the old link come back, thumbnail included
    let guard = store.lock().unwrap();
    assert_eq!(guard.photo(&photo).unwrap().item_id, Some(item_a.clone()));
    let old = guard.item(&item_a).unwrap();
    assert_eq!(old.photo_ids, vec![photo.clone()]);
    assert_eq!(old.thumbnail_photo_id, Some(photo.clone()));
    assert!(guard.item(&item_b).unwrap().photo_ids.is_empty());
    assert_eq!(guard.item(&item_b).unwrap().thumbnail_photo_id, None);
}

#[tokio::test]
async fn test_create_rollback_restores_seed_photo_previous_item() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_a = EntityId::committed("iA");
    {
        let mut guard = store.lock().unwrap();
        guard.insert_item(Item::new(item_a.clone(), "old home"));
        guard.link_photo_to_item(&photo, &item_a);
    }
    remote.fail_on("create_item");

    let (pending, handle) = executor.create_item("split out", None, Some(photo.clone()));
    assert!(handle.wait().await.is_err());

    let guard = store.lock().unwrap();
    assert!(guard.item(&pending).is_none());
    assert_eq!(guard.photo(&photo).unwrap().item_id, Some(item_a.clone()));
    let old = guard.item(&item_a).unwrap();
    assert_eq!(old.photo_ids, vec![photo.clone()]);
    assert_eq!(old.thumbnail_photo_id, Some(photo));
}

#[tokio::test]
async fn test_delete_item_detaches_photos_before_removal() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "tv"));
    store.lock().unwrap().link_photo_to_item(&photo, &item_id);
    executor.set_focused_item(Some(item_id.clone()));

    executor.delete_item(&item_id).wait().await.unwrap();

    let guard = store.lock().unwrap();
    assert!(guard.item(&item_id).is_none());
    assert_eq!(guard.photo(&photo).unwrap().item_id, None);
    assert_eq!(executor.focused_item(), None);
    assert_eq!(remote.calls(), vec!["delete_item i1".to_string()]);
}

#[tokio::test]
async fn test_delete_item_rollback_restores_links() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "tv"));
    store.lock().unwrap().link_photo_to_item(&photo, &item_id);
    remote.fail_on("delete_item");

    let result = executor.delete_item(&item_id).wait().await;
    assert!(result.is_err());

    let guard = store.lock().unwrap();
    let item = guard.item(&item_id).expect("item restored");
    assert_eq!(item.photo_ids, vec![photo.clone()]);
    assert_eq!(guard.photo(&photo).unwrap().item_id, Some(item_id.clone()));
}

#[tokio::test]
async fn test_remove_last_photo_deletes_item_and_clears_focus() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "chair"));
    store.lock().unwrap().link_photo_to_item(&photo, &item_id);
    executor.set_focused_item(Some(item_id.clone()));

    executor.remove_photo_from_item(&photo).wait().await.unwrap();

    let guard = store.lock().unwrap();
    assert!(guard.item(&item_id).is_none());
    assert_eq!(guard.photo(&photo).unwrap().item_id, None);
    assert_eq!(executor.focused_item(), None);
    let calls = remote.calls();
    assert_eq!(calls[0], r#"update_file p1 {"item_id":null}"#);
    assert_eq!(calls[1], "delete_item i1");
}

#[tokio::test]
async fn test_remove_photo_keeps_item_with_remaining_photos() {
    let (executor, _remote, store) = setup();
    let p1 = seed_photo(&store, "p1");
    let p2 = seed_photo(&store, "p2");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "desk"));
    store.lock().unwrap().link_photo_to_item(&p1, &item_id);
    store.lock().unwrap().link_photo_to_item(&p2, &item_id);

    executor.remove_photo_from_item(&p1).wait().await.unwrap();

    let guard = store.lock().unwrap();
    let item = guard.item(&item_id).unwrap();
    assert_eq!(item.photo_ids, vec![p2.clone()]);
    assert_eq!(item.thumbnail_photo_id, Some(p2));
}

#[tokio::test]
async fn test_delete_photo_that_empties_item_deletes_item_remotely() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "mirror"));
    store.lock().unwrap().link_photo_to_item(&photo, &item_id);

    executor.delete_photo(&photo).wait().await.unwrap();

    let guard = store.lock().unwrap();
    assert!(guard.photo(&photo).is_none());
    assert!(guard.item(&item_id).is_none());
    assert_eq!(
        remote.calls(),
        vec!["delete_file p1".to_string(), "delete_item i1".to_string()]
    );
}

#[tokio::test]
async fn test_move_item_to_room_propagates_and_calls_remote() {
    let (executor, remote, store) = setup();
    let photo = seed_photo(&store, "p1");
    let item_id = EntityId::committed("i1");
    let room_id = EntityId::committed("r1");
    store
        .lock()
        .unwrap()
        .insert_room(Room::new(room_id.clone(), "Kitchen"));
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "oven"));
    store.lock().unwrap().link_photo_to_item(&photo, &item_id);

    executor
        .move_item_to_room(&item_id, Some(room_id.clone()))
        .wait()
        .await
        .unwrap();

    let guard = store.lock().unwrap();
    assert_eq!(guard.item(&item_id).unwrap().room_id, Some(room_id.clone()));
    assert_eq!(guard.photo(&photo).unwrap().room_id, Some(room_id));
    assert_eq!(remote.calls(), vec!["move_item i1 r1".to_string()]);
}

#[tokio::test]
async fn test_move_into_pending_room_flushes_after_room_commit() {
    let (executor, remote, store) = setup();
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "bed"));

    let (pending_room, room_handle) = executor.create_room("Bedroom");
    executor
        .move_item_to_room(&item_id, Some(pending_room.clone()))
        .wait()
        .await
        .unwrap();
    room_handle.wait().await.unwrap();

    let calls = remote.calls();
    assert_eq!(calls[0], "create_room claim-1 Bedroom");
    assert_eq!(calls[1], "move_item i1 room-1");
    let guard = store.lock().unwrap();
    assert_eq!(
        guard.item(&item_id).unwrap().room_id,
        Some(EntityId::committed("room-1"))
    );
}

#[tokio::test]
async fn test_delete_room_rollback_restores_references() {
    let (executor, remote, store) = setup();
    let room_id = EntityId::committed("r1");
    let item_id = EntityId::committed("i1");
    store
        .lock()
        .unwrap()
        .insert_room(Room::new(room_id.clone(), "Garage"));
    store
        .lock()
        .unwrap()
        .insert_item(Item::new(item_id.clone(), "bike"));
    store
        .lock()
        .unwrap()
        .set_item_room(&item_id, Some(room_id.clone()));
    remote.fail_on("delete_room");

    let result = executor.delete_room(&room_id).wait().await;
    assert!(result.is_err());

    let guard = store.lock().unwrap();
    assert!(guard.room(&room_id).is_some());
    assert_eq!(guard.item(&item_id).unwrap().room_id, Some(room_id));
}

#[tokio::test]
async fn test_item_deleted_while_pending_is_deleted_remotely_after_create() {
    let (executor, remote, _store) = setup();

    let (pending, create) = executor.create_item("couch", None, None);
    executor.delete_item(&pending).wait().await.unwrap();
    create.wait().await.unwrap();

    let calls = remote.calls();
    assert_eq!(calls[0], "create_item claim-1 couch");
    assert_eq!(calls[1], "delete_item item-42");
}

#[tokio::test]
async fn test_apply_file_records_overlays_labels_and_urls() {
    let (executor, _remote, store) = setup();
    let photo = seed_photo(&store, "f1");

    executor.apply_file_records(&[crate::api::FileRecord {
        id: "f1".to_string(),
        url: Some("https://cdn.test/f1.jpg".to_string()),
        labels: vec!["sofa".to_string(), "leather".to_string()],
        item_id: None,
        room_id: None,
    }]);

    let guard = store.lock().unwrap();
    let p = guard.photo(&photo).unwrap();
    assert_eq!(p.url.as_deref(), Some("https://cdn.test/f1.jpg"));
    assert_eq!(p.labels, vec!["sofa", "leather"]);
}
