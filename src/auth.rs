use chrono::{DateTime, Utc};

use crate::error::{WorkbenchError, WorkbenchResult};

/// Bearer credential handed out by an external auth collaborator.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= Utc::now(),
            None => false,
        }
    }
}

/// Credential source. The engine never acquires tokens itself; it asks
/// the provider for the latest one before each authenticated call or
/// socket connect attempt.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> WorkbenchResult<AccessToken>;
}

/// Reads a static token from WORKBENCH_TOKEN. Used by the diagnostic
/// binary; real frontends supply their own provider.
pub struct EnvTokenProvider;

#[async_trait::async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> WorkbenchResult<AccessToken> {
        let token = std::env::var("WORKBENCH_TOKEN")
            .map_err(|_| WorkbenchError::Auth("WORKBENCH_TOKEN not set".to_string()))?;
        Ok(AccessToken::new(token, None))
    }
}
