use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::auth::TokenProvider;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::models::ItemPatch;

use super::types::{
    AttachFileBody, CreatedEntity, FilePatch, FileRecord, ItemCreateBody, RoomCreateBody,
    UploadSpec, UploadTarget, UploadUrlRequest,
};

/// Remote side of the workbench. Implemented over REST by [`ApiClient`];
/// tests substitute in-memory fakes.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    async fn request_upload_targets(
        &self,
        claim_id: &str,
        files: &[UploadSpec],
        room_id: Option<&str>,
    ) -> WorkbenchResult<Vec<UploadTarget>>;

    async fn create_item(
        &self,
        claim_id: &str,
        body: &ItemCreateBody,
    ) -> WorkbenchResult<CreatedEntity>;

    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> WorkbenchResult<()>;

    async fn move_item(&self, item_id: &str, room_id: Option<&str>) -> WorkbenchResult<()>;

    async fn delete_item(&self, item_id: &str) -> WorkbenchResult<()>;

    async fn attach_file(&self, item_id: &str, body: &AttachFileBody) -> WorkbenchResult<()>;

    async fn update_file(&self, file_id: &str, patch: &FilePatch) -> WorkbenchResult<()>;

    async fn delete_file(&self, file_id: &str) -> WorkbenchResult<()>;

    async fn fetch_files(&self, ids: &[String]) -> WorkbenchResult<Vec<FileRecord>>;

    async fn create_room(
        &self,
        claim_id: &str,
        body: &RoomCreateBody,
    ) -> WorkbenchResult<CreatedEntity>;

    async fn delete_room(&self, claim_id: &str, room_id: &str) -> WorkbenchResult<()>;
}

/// REST client for the claims backend. Every call carries the latest
/// bearer token from the external credential source.
pub struct ApiClient {
    base_url: String,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> WorkbenchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WorkbenchError::Internal(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> WorkbenchResult<String> {
        let token = self.tokens.access_token().await?;
        if token.is_expired() {
            return Err(WorkbenchError::Auth("credential expired".to_string()));
        }
        Ok(token.token)
    }

    async fn send_json<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> WorkbenchResult<reqwest::Response> {
        let token = self.bearer().await?;
        let mut request = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response)
    }
}

#[async_trait::async_trait]
impl RemoteStore for ApiClient {
    async fn request_upload_targets(
        &self,
        claim_id: &str,
        files: &[UploadSpec],
        room_id: Option<&str>,
    ) -> WorkbenchResult<Vec<UploadTarget>> {
        let body = UploadUrlRequest {
            files: files.to_vec(),
            room_id: room_id.map(str::to_string),
        };
        let response = self
            .send_json(
                reqwest::Method::POST,
                &format!("/claims/{claim_id}/upload-url"),
                Some(&body),
            )
            .await?;
        let targets: Vec<UploadTarget> = response.json().await?;
        tracing::debug!("upload targets issued: claim={}, files={}", claim_id, targets.len());
        Ok(targets)
    }

    async fn create_item(
        &self,
        claim_id: &str,
        body: &ItemCreateBody,
    ) -> WorkbenchResult<CreatedEntity> {
        let response = self
            .send_json(
                reqwest::Method::POST,
                &format!("/claims/{claim_id}/items"),
                Some(body),
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> WorkbenchResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/items/{item_id}"),
            Some(patch),
        )
        .await?;
        Ok(())
    }

    async fn move_item(&self, item_id: &str, room_id: Option<&str>) -> WorkbenchResult<()> {
        let body = serde_json::json!({ "room_id": room_id });
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/items/{item_id}"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: &str) -> WorkbenchResult<()> {
        self.send_json::<()>(reqwest::Method::DELETE, &format!("/items/{item_id}"), None)
            .await?;
        Ok(())
    }

    async fn attach_file(&self, item_id: &str, body: &AttachFileBody) -> WorkbenchResult<()> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/items/{item_id}/files"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn update_file(&self, file_id: &str, patch: &FilePatch) -> WorkbenchResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/files/{file_id}"),
            Some(patch),
        )
        .await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> WorkbenchResult<()> {
        self.send_json::<()>(reqwest::Method::DELETE, &format!("/files/{file_id}"), None)
            .await?;
        Ok(())
    }

    async fn fetch_files(&self, ids: &[String]) -> WorkbenchResult<Vec<FileRecord>> {
        let joined = ids.join(",");
        let path = format!("/files?ids={}", urlencoding::encode(&joined));
        let response = self.send_json::<()>(reqwest::Method::GET, &path, None).await?;
        Ok(response.json().await?)
    }

    async fn create_room(
        &self,
        claim_id: &str,
        body: &RoomCreateBody,
    ) -> WorkbenchResult<CreatedEntity> {
        let response = self
            .send_json(
                reqwest::Method::POST,
                &format!("/claims/{claim_id}/rooms"),
                Some(body),
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_room(&self, claim_id: &str, room_id: &str) -> WorkbenchResult<()> {
        self.send_json::<()>(
            reqwest::Method::DELETE,
            &format!("/claims/{claim_id}/rooms/{room_id}"),
            None,
        )
        .await?;
        Ok(())
    }
}
