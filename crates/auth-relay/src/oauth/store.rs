//! Server-side retention of refresh tokens.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Persistence for refresh tokens, keyed by the id token's subject.
///
/// Implementations must be safe to share across concurrent requests.
/// A failed `store` never fails the exchange that produced the token; the
/// caller logs the error and carries on.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Save (or replace) the refresh token for a subject.
    async fn store(&self, subject: &str, refresh_token: &str) -> anyhow::Result<()>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn get(&self, subject: &str) -> Option<String> {
        self.tokens.read().await.get(subject).cloned()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn store(&self, subject: &str, refresh_token: &str) -> anyhow::Result<()> {
        self.tokens
            .write()
            .await
            .insert(subject.to_string(), refresh_token.to_string());
        Ok(())
    }
}
