//! In-memory credential cache for tests and embedding.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::CredentialCache;
use crate::models::{StorageCredentials, TokenPair};

#[derive(Default)]
pub struct MemoryCache {
    api: Mutex<Option<TokenPair>>,
    storage: Mutex<Option<StorageCredentials>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialCache for MemoryCache {
    async fn load_api_credentials(&self) -> Result<Option<TokenPair>> {
        Ok(self.api.lock().await.clone())
    }

    async fn save_api_credentials(&self, tokens: &TokenPair) -> Result<()> {
        *self.api.lock().await = Some(tokens.clone());
        Ok(())
    }

    async fn load_storage_credentials(&self) -> Result<Option<StorageCredentials>> {
        Ok(self.storage.lock().await.clone())
    }

    async fn save_storage_credentials(&self, credentials: &StorageCredentials) -> Result<()> {
        *self.storage.lock().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.api.lock().await = None;
        *self.storage.lock().await = None;
        Ok(())
    }
}
