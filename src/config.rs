use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::default_cache_dir;
use crate::credentials::LoginConfig;
use crate::duration::deserialize_duration;
use crate::hubic::{Scope, API_BASE, DEFAULT_TIMEOUT};

fn default_api_base() -> String {
    API_BASE.to_string()
}

/// The registered redirect URI; hubiC apps commonly register the API root.
fn default_redirect_uri() -> String {
    API_BASE.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_verify_state() -> bool {
    true
}

fn default_client_id_file() -> PathBuf {
    PathBuf::from("client_id.txt")
}

fn default_client_secret_file() -> PathBuf {
    PathBuf::from("client_secret.txt")
}

/// Application configuration (`pubic.toml`).
///
/// ```toml
/// redirect_uri = "https://api.hubic.com/"
/// scope = "account.r,credentials.r"
/// timeout = "30s"
/// client_id_file = "client_id.txt"
/// client_secret_file = "client_secret.txt"
///
/// [login]
/// backend = "file"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API base URL. Only worth changing for tests or a proxy.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Redirect URI registered for the client application.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Requested permissions.
    pub scope: Scope,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Reject redirects whose echoed `state` differs from the one sent.
    #[serde(default = "default_verify_state")]
    pub verify_state: bool,

    /// File holding the client id on its first line. Relative paths are
    /// resolved from the config file location.
    #[serde(default = "default_client_id_file")]
    pub client_id_file: PathBuf,

    /// File holding the client secret on its first line.
    #[serde(default = "default_client_secret_file")]
    pub client_secret_file: PathBuf,

    /// Where cached credentials live. Defaults to `~/.cache/pubic`.
    pub cache_dir: Option<PathBuf>,

    /// Login/password source.
    pub login: LoginConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            redirect_uri: default_redirect_uri(),
            scope: Scope::default(),
            timeout: default_timeout(),
            verify_state: default_verify_state(),
            client_id_file: default_client_id_file(),
            client_secret_file: default_client_secret_file(),
            cache_dir: None,
            login: LoginConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve relative paths against `base_dir`.
    pub fn resolve(self, base_dir: &Path) -> Result<ResolvedConfig> {
        let cache_dir = match self.cache_dir {
            Some(dir) => resolve_path(base_dir, dir),
            None => default_cache_dir()?,
        };

        Ok(ResolvedConfig {
            api_base: self.api_base,
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            timeout: self.timeout,
            verify_state: self.verify_state,
            client_id_file: resolve_path(base_dir, self.client_id_file),
            client_secret_file: resolve_path(base_dir, self.client_secret_file),
            cache_dir,
            login: self.login.resolve_paths(base_dir),
        })
    }
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base: String,
    pub redirect_uri: String,
    pub scope: Scope,
    pub timeout: Duration,
    pub verify_state: bool,
    pub client_id_file: PathBuf,
    pub client_secret_file: PathBuf,
    pub cache_dir: PathBuf,
    pub login: LoginConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./pubic.toml` if it exists in current directory
/// 2. `~/.config/pubic/pubic.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("pubic.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("pubic").join("pubic.toml");
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// Relative paths are resolved against the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        Config::load(&config_path)?.resolve(config_dir)
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a config file, relative paths resolve against the current
    /// directory, where `client_id.txt` and friends are expected.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Config::default().resolve(&cwd)
        }
    }
}
