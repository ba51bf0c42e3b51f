use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upload failed for {name}: {message}")]
    Upload { name: String, message: String },

    #[error("Remote call failed, local change reverted: {0}")]
    Reconciliation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

/// A user-visible, dismissable error entry. Validation and transport
/// failures collect into a notice list instead of aborting the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Transport,
    Reconciliation,
}

impl Notice {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Validation,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Transport,
        }
    }

    pub fn reconciliation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Reconciliation,
        }
    }
}
