//! Shared test doubles.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::api::{
    AttachFileBody, CreatedEntity, FilePatch, FileRecord, ItemCreateBody, RemoteStore,
    RoomCreateBody, UploadSpec, UploadTarget,
};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::models::ItemPatch;

/// In-memory remote store recording every call in order. Operations
/// listed in `failing` return a reconciliation-style error instead.
#[derive(Default)]
pub struct MockRemote {
    pub calls: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub file_records: Mutex<Vec<FileRecord>>,
    item_seq: Mutex<u32>,
    room_seq: Mutex<u32>,
    file_seq: Mutex<u32>,
    batch_seq: Mutex<u32>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> WorkbenchResult<()> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(WorkbenchError::Reconciliation(format!("{op} rejected")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for MockRemote {
    async fn request_upload_targets(
        &self,
        claim_id: &str,
        files: &[UploadSpec],
        _room_id: Option<&str>,
    ) -> WorkbenchResult<Vec<UploadTarget>> {
        self.record(format!("request_upload_targets {claim_id} x{}", files.len()));
        self.check("request_upload_targets")?;
        let batch = {
            let mut seq = self.batch_seq.lock().unwrap();
            *seq += 1;
            format!("b{seq}")
        };
        let targets = files
            .iter()
            .map(|f| {
                let mut seq = self.file_seq.lock().unwrap();
                *seq += 1;
                UploadTarget {
                    name: f.name.clone(),
                    status: "ok".to_string(),
                    upload_url: Some(format!("http://uploads.test/{}", f.name)),
                    s3_key: Some(format!("claims/{}/{}", claim_id, f.name)),
                    method: Some("PUT".to_string()),
                    content_type: Some(f.content_type.clone()),
                    file_id: format!("f{seq}"),
                    batch_id: batch.clone(),
                    error: None,
                }
            })
            .collect();
        Ok(targets)
    }

    async fn create_item(
        &self,
        claim_id: &str,
        body: &ItemCreateBody,
    ) -> WorkbenchResult<CreatedEntity> {
        self.record(format!("create_item {claim_id} {}", body.name));
        self.check("create_item")?;
        let mut seq = self.item_seq.lock().unwrap();
        *seq += 1;
        Ok(CreatedEntity {
            id: format!("item-{}", 41 + *seq),
        })
    }

    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> WorkbenchResult<()> {
        self.record(format!(
            "update_item {item_id} {}",
            patch.name.clone().unwrap_or_default()
        ));
        self.check("update_item")
    }

    async fn move_item(&self, item_id: &str, room_id: Option<&str>) -> WorkbenchResult<()> {
        self.record(format!("move_item {item_id} {}", room_id.unwrap_or("null")));
        self.check("move_item")
    }

    async fn delete_item(&self, item_id: &str) -> WorkbenchResult<()> {
        self.record(format!("delete_item {item_id}"));
        self.check("delete_item")
    }

    async fn attach_file(&self, item_id: &str, body: &AttachFileBody) -> WorkbenchResult<()> {
        self.record(format!("attach_file {item_id} {}", body.file_id));
        self.check("attach_file")
    }

    async fn update_file(&self, file_id: &str, patch: &FilePatch) -> WorkbenchResult<()> {
        self.record(format!(
            "update_file {file_id} {}",
            serde_json::to_string(patch).unwrap_or_default()
        ));
        self.check("update_file")
    }

    async fn delete_file(&self, file_id: &str) -> WorkbenchResult<()> {
        self.record(format!("delete_file {file_id}"));
        self.check("delete_file")
    }

    async fn fetch_files(&self, ids: &[String]) -> WorkbenchResult<Vec<FileRecord>> {
        self.record(format!("fetch_files {}", ids.join(",")));
        self.check("fetch_files")?;
        let records = self.file_records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn create_room(
        &self,
        claim_id: &str,
        body: &RoomCreateBody,
    ) -> WorkbenchResult<CreatedEntity> {
        self.record(format!("create_room {claim_id} {}", body.name));
        self.check("create_room")?;
        let mut seq = self.room_seq.lock().unwrap();
        *seq += 1;
        Ok(CreatedEntity {
            id: format!("room-{seq}"),
        })
    }

    async fn delete_room(&self, claim_id: &str, room_id: &str) -> WorkbenchResult<()> {
        self.record(format!("delete_room {claim_id} {room_id}"));
        self.check("delete_room")
    }
}
