pub mod client;
pub mod types;

pub use client::{ApiClient, RemoteStore};
pub use types::{
    AttachFileBody, CreatedEntity, FilePatch, FileRecord, ItemCreateBody, RoomCreateBody,
    UploadSpec, UploadTarget, UploadUrlRequest,
};
