//! Persistence for credentials obtained by the flow.
//!
//! The orchestrator consults the cache before any network call and writes to
//! it after every fresh fetch. Expiry is judged by the caller, not the cache.

mod json_file;
mod memory;

pub use json_file::{default_cache_dir, JsonFileCache};
pub use memory::MemoryCache;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{StorageCredentials, TokenPair};

#[async_trait]
pub trait CredentialCache: Send + Sync {
    /// Returns `Ok(None)` if no token pair has been saved.
    async fn load_api_credentials(&self) -> Result<Option<TokenPair>>;

    async fn save_api_credentials(&self, tokens: &TokenPair) -> Result<()>;

    /// Returns `Ok(None)` if no storage credentials have been saved.
    async fn load_storage_credentials(&self) -> Result<Option<StorageCredentials>>;

    async fn save_storage_credentials(&self, credentials: &StorageCredentials) -> Result<()>;

    /// Forget everything.
    async fn clear(&self) -> Result<()>;
}
