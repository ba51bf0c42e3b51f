pub mod api;
pub mod auth;
pub mod config;
pub mod dnd;
pub mod error;
pub mod models;
pub mod mutation;
pub mod realtime;
pub mod search;
pub mod store;
pub mod upload;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use error::{Notice, NoticeKind, WorkbenchError, WorkbenchResult};
