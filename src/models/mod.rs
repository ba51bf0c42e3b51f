pub mod id;
pub mod item;
pub mod photo;
pub mod room;
pub mod upload;

pub use id::EntityId;
pub use item::{Item, ItemAttributes, ItemPatch};
pub use photo::Photo;
pub use room::Room;
pub use upload::{BatchFile, LocalFile, UploadBatch, UploadStatus};
