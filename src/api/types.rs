use serde::{Deserialize, Serialize};

/// One file in an upload-url request.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSpec {
    pub name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlRequest {
    pub files: Vec<UploadSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

/// Per-file destination handle returned by the upload-url endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    pub name: String,
    pub status: String,
    pub upload_url: Option<String>,
    pub s3_key: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<String>,
    pub file_id: String,
    pub batch_id: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemCreateBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachFileBody {
    pub file_id: String,
    pub seed_labels: Vec<String>,
}

/// PATCH /files/{id} body. Double Option so an explicit null detaches
/// while an absent field leaves the reference untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomCreateBody {
    pub name: String,
}

/// Server-issued identifier for an optimistically created entity.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEntity {
    pub id: String,
}

/// Server-side view of a file, fetched to refresh labels and URLs after
/// processing events.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub url: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub item_id: Option<String>,
    pub room_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_patch_serializes_explicit_null_detach() {
        let patch = FilePatch {
            item_id: Some(None),
            room_id: None,
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"item_id":null}"#);
    }

    #[test]
    fn test_upload_target_tolerates_missing_optionals() {
        let json = r#"{"name":"a.jpg","status":"error","file_id":"f1","batch_id":"b1","error":"too large"}"#;
        let target: UploadTarget = serde_json::from_str(json).unwrap();
        assert!(target.upload_url.is_none());
        assert_eq!(target.error.as_deref(), Some("too large"));
    }
}
