//! Chunked-upload pipeline with presigned-URL handoff.
//!
//! A file selection is validated against size and count limits, split
//! into size-bounded batches, and each batch asks the backend for one
//! upload target per file. The bytes then go straight to storage (never
//! through the API), in parallel within a batch, with per-file success
//! and failure tracked independently.

mod tracker;

pub use tracker::BatchTracker;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::join_all;

use crate::api::{RemoteStore, UploadSpec, UploadTarget};
use crate::config::Config;
use crate::error::{Notice, WorkbenchError, WorkbenchResult};
use crate::models::{BatchFile, EntityId, LocalFile, Photo, UploadBatch, UploadStatus};
use crate::store::EntityStore;

#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_selection_files: usize,
    pub max_batch_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 100 * 1024 * 1024,
            max_selection_files: 100,
            max_batch_bytes: 50 * 1024 * 1024,
        }
    }
}

impl From<&Config> for UploadLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            max_selection_files: config.max_selection_files,
            max_batch_bytes: config.max_batch_bytes,
        }
    }
}

/// Direct byte transfer to a presigned destination. Separated from the
/// pipeline so tests can run without a storage endpoint.
#[async_trait::async_trait]
pub trait Transfer: Send + Sync {
    async fn send(&self, target: &UploadTarget, file: &LocalFile) -> Result<(), String>;
}

/// Transfers bytes with a plain HTTP client; presigned URLs carry their
/// own authorization, so no bearer header is attached.
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> WorkbenchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| WorkbenchError::Internal(format!("transfer client build failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transfer for HttpTransfer {
    async fn send(&self, target: &UploadTarget, file: &LocalFile) -> Result<(), String> {
        let url = target
            .upload_url
            .as_deref()
            .ok_or_else(|| "no upload url issued".to_string())?;
        let method = target
            .method
            .as_deref()
            .and_then(|m| reqwest::Method::from_bytes(m.as_bytes()).ok())
            .unwrap_or(reqwest::Method::PUT);
        let content_type = target
            .content_type
            .clone()
            .unwrap_or_else(|| file.content_type.clone());

        let response = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(file.data.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;
        response.error_for_status().map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Order-preserving greedy partition bounded by a cumulative byte size.
/// A single file exceeding the bound gets its own batch.
pub fn partition_batches(files: Vec<LocalFile>, max_batch_bytes: u64) -> Vec<Vec<LocalFile>> {
    let mut batches: Vec<Vec<LocalFile>> = Vec::new();
    let mut current: Vec<LocalFile> = Vec::new();
    let mut current_bytes = 0u64;

    for file in files {
        let size = file.size();
        if size >= max_batch_bytes {
            if !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_bytes = 0;
            }
            batches.push(vec![file]);
            continue;
        }
        if current_bytes + size > max_batch_bytes && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(file);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

pub struct UploadPipeline<R: RemoteStore + 'static, T: Transfer + 'static> {
    claim_id: String,
    remote: Arc<R>,
    transfer: Arc<T>,
    store: Arc<Mutex<EntityStore>>,
    tracker: Arc<Mutex<BatchTracker>>,
    notices: Arc<Mutex<Vec<Notice>>>,
    limits: UploadLimits,
}

impl<R: RemoteStore, T: Transfer> UploadPipeline<R, T> {
    pub fn new(
        claim_id: impl Into<String>,
        remote: Arc<R>,
        transfer: Arc<T>,
        store: Arc<Mutex<EntityStore>>,
        tracker: Arc<Mutex<BatchTracker>>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            remote,
            transfer,
            store,
            tracker,
            notices: Arc::new(Mutex::new(Vec::new())),
            limits,
        }
    }

    pub fn tracker(&self) -> Arc<Mutex<BatchTracker>> {
        Arc::clone(&self.tracker)
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .expect("notice list mutex poisoned")
            .drain(..)
            .collect()
    }

    fn lock_store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().expect("entity store mutex poisoned")
    }

    fn lock_tracker(&self) -> MutexGuard<'_, BatchTracker> {
        self.tracker.lock().expect("batch tracker mutex poisoned")
    }

    fn push_notice(&self, notice: Notice) {
        self.notices
            .lock()
            .expect("notice list mutex poisoned")
            .push(notice);
    }

    /// Apply size and count limits. Rejected files are surfaced as
    /// notices and excluded; they never abort the rest of the selection.
    fn validate(&self, files: Vec<LocalFile>) -> Vec<LocalFile> {
        let mut accepted = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            if index >= self.limits.max_selection_files {
                self.push_notice(Notice::validation(format!(
                    "{}: selection limit of {} files exceeded",
                    file.name, self.limits.max_selection_files
                )));
                continue;
            }
            if file.size() > self.limits.max_file_bytes {
                self.push_notice(Notice::validation(format!(
                    "{}: exceeds the {} byte file limit",
                    file.name, self.limits.max_file_bytes
                )));
                continue;
            }
            accepted.push(file);
        }
        accepted
    }

    /// Run the full pipeline for a selection. Returns the correlation ids
    /// of the batches that were successfully dispatched.
    pub async fn upload(
        &self,
        files: Vec<LocalFile>,
        room_id: Option<EntityId>,
    ) -> Vec<String> {
        let accepted = self.validate(files);
        let batches = partition_batches(accepted, self.limits.max_batch_bytes);
        let mut dispatched = Vec::new();

        for batch in batches {
            if let Some(batch_id) = self.upload_batch(batch, room_id.clone()).await {
                dispatched.push(batch_id);
            }
        }
        dispatched
    }

    /// One batch: request targets, register photos and tracking, then
    /// transfer every file in parallel. A target-request failure aborts
    /// only this batch.
    async fn upload_batch(
        &self,
        files: Vec<LocalFile>,
        room_id: Option<EntityId>,
    ) -> Option<String> {
        let specs: Vec<UploadSpec> = files
            .iter()
            .map(|f| UploadSpec {
                name: f.name.clone(),
                content_type: f.content_type.clone(),
            })
            .collect();

        let targets = match self
            .remote
            .request_upload_targets(
                &self.claim_id,
                &specs,
                room_id.as_ref().map(|r| r.as_str()),
            )
            .await
        {
            Ok(targets) => targets,
            Err(err) => {
                tracing::warn!("upload target request failed: {}", err);
                self.push_notice(Notice::transport(format!(
                    "upload request failed for {} files: {err}",
                    files.len()
                )));
                return None;
            }
        };

        let batch_id = targets.first().map(|t| t.batch_id.clone())?;

        let mut tracked = Vec::with_capacity(targets.len());
        for target in &targets {
            let failed = target.error.is_some() || target.upload_url.is_none();
            if let Some(error) = &target.error {
                self.push_notice(Notice::transport(format!("{}: {error}", target.name)));
            }
            tracked.push(BatchFile {
                name: target.name.clone(),
                file_id: target.file_id.clone(),
                remote_key: target.s3_key.clone(),
                status: if failed {
                    UploadStatus::Failed
                } else {
                    UploadStatus::Uploading
                },
                error: target.error.clone(),
            });

            let mut photo = Photo::new(EntityId::committed(&target.file_id), &target.name);
            photo.room_id = room_id.clone();
            photo.status = if failed {
                UploadStatus::Failed
            } else {
                UploadStatus::Uploading
            };
            self.lock_store().insert_photo(photo);
        }
        self.lock_tracker()
            .track(UploadBatch::new(batch_id.clone(), tracked));

        // targets come back in request order, so pair by position; names
        // are not unique within a selection
        let transfers = targets
            .iter()
            .zip(files.iter())
            .filter(|(t, _)| t.error.is_none() && t.upload_url.is_some())
            .map(|(t, f)| (t.clone(), f.clone()));

        let results = join_all(transfers.map(|(target, file)| {
            let transfer = Arc::clone(&self.transfer);
            async move {
                let outcome = transfer.send(&target, &file).await;
                (target, outcome)
            }
        }))
        .await;

        for (target, outcome) in results {
            match outcome {
                Ok(()) => {
                    tracing::info!("uploaded: file={}, batch={}", target.file_id, batch_id);
                    self.mark_file(&batch_id, &target.file_id, UploadStatus::Uploaded, None);
                }
                Err(message) => {
                    tracing::warn!(
                        "upload failed: file={}, batch={}, error={}",
                        target.file_id,
                        batch_id,
                        message
                    );
                    self.push_notice(Notice::transport(format!(
                        "{}: upload failed: {message}",
                        target.name
                    )));
                    self.mark_file(
                        &batch_id,
                        &target.file_id,
                        UploadStatus::Failed,
                        Some(message),
                    );
                }
            }
        }

        Some(batch_id)
    }

    fn mark_file(
        &self,
        batch_id: &str,
        file_id: &str,
        status: UploadStatus,
        error: Option<String>,
    ) {
        self.lock_tracker().advance(batch_id, file_id, status, error);
        let id = EntityId::committed(file_id);
        if let Some(photo) = self.lock_store().photo_mut(&id) {
            if photo.status.can_advance_to(status) {
                photo.status = status;
            }
        }
    }

    /// Drop batches that never received a terminal push event, surfacing
    /// their unfinished files as errored photos.
    pub fn expire_stale_batches(&self) -> Vec<String> {
        let expired = self.lock_tracker().expire_stale(chrono::Utc::now());
        let mut ids = Vec::with_capacity(expired.len());
        for batch in expired {
            let mut store = self.lock_store();
            for file in &batch.files {
                if file.status != UploadStatus::Error {
                    continue;
                }
                let id = EntityId::committed(&file.file_id);
                if let Some(photo) = store.photo_mut(&id) {
                    if !photo.status.is_terminal() {
                        photo.status = UploadStatus::Error;
                    }
                }
            }
            drop(store);
            self.push_notice(Notice::transport(format!(
                "upload batch {} abandoned without completing",
                batch.batch_id
            )));
            ids.push(batch.batch_id);
        }
        ids
    }
}
