use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use super::CredentialCache;
use crate::models::{StorageCredentials, TokenPair};

const API_CREDENTIALS_FILE: &str = "api_credentials.json";
const STORAGE_CREDENTIALS_FILE: &str = "storage_credentials.json";

/// JSON file-based credential cache.
///
/// Directory structure:
/// ```text
/// ~/.cache/pubic/
///   api_credentials.json
///   storage_credentials.json
/// ```
///
/// Files are local-only and hold live tokens; on Unix they are written with
/// mode 0600.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    cache_dir: PathBuf,
}

impl JsonFileCache {
    /// Create a cache in the default location (`~/.cache/pubic/`).
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(default_cache_dir()?))
    }

    /// Create a cache at a custom location. The directory is created on first save.
    pub fn with_path(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn api_file(&self) -> PathBuf {
        self.cache_dir.join(API_CREDENTIALS_FILE)
    }

    fn storage_file(&self) -> PathBuf {
        self.cache_dir.join(STORAGE_CREDENTIALS_FILE)
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to stat cache file: {path:?}"))?
        {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read cache file: {path:?}"))?;

        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache file: {path:?}"))?;

        Ok(Some(value))
    }

    async fn write_json<T: Serialize + Sync>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to create cache dir: {:?}", self.cache_dir))?;

        let content = serde_json::to_string_pretty(value).context("Failed to serialize credentials")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write cache file: {path:?}"))?;

        restrict_permissions(path).await
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to delete cache file: {path:?}")),
        }
    }
}

/// `~/.cache/pubic`, or the platform equivalent.
pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("pubic"))
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("Failed to restrict permissions on {path:?}"))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl CredentialCache for JsonFileCache {
    async fn load_api_credentials(&self) -> Result<Option<TokenPair>> {
        self.read_json(&self.api_file()).await
    }

    async fn save_api_credentials(&self, tokens: &TokenPair) -> Result<()> {
        self.write_json(&self.api_file(), tokens).await
    }

    async fn load_storage_credentials(&self) -> Result<Option<StorageCredentials>> {
        self.read_json(&self.storage_file()).await
    }

    async fn save_storage_credentials(&self, credentials: &StorageCredentials) -> Result<()> {
        self.write_json(&self.storage_file(), credentials).await
    }

    async fn clear(&self) -> Result<()> {
        self.remove(&self.api_file()).await?;
        self.remove(&self.storage_file()).await
    }
}
