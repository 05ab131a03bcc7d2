//! Login backend configuration (the `[login]` table of `pubic.toml`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::files::FileLoginProvider;
use super::pass::{PassConfig, PassLoginProvider};
use super::LoginProvider;

fn default_login_file() -> PathBuf {
    PathBuf::from("user_login.txt")
}

fn default_password_file() -> PathBuf {
    PathBuf::from("user_password.txt")
}

fn default_prompt_fallback() -> bool {
    true
}

/// Which backend supplies the hubiC login and password.
///
/// # Example
///
/// ```toml
/// [login]
/// backend = "pass"
/// path = "web/hubic.com"
/// login_field = "login"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum LoginConfig {
    /// First line of two plain files, prompting for whichever is missing.
    File {
        #[serde(default = "default_login_file")]
        login_file: PathBuf,
        #[serde(default = "default_password_file")]
        password_file: PathBuf,
        #[serde(default = "default_prompt_fallback")]
        prompt_fallback: bool,
    },
    /// Password-store (pass) entry.
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
    /// Always prompt on the terminal.
    Prompt,
}

impl Default for LoginConfig {
    fn default() -> Self {
        LoginConfig::File {
            login_file: default_login_file(),
            password_file: default_password_file(),
            prompt_fallback: default_prompt_fallback(),
        }
    }
}

impl LoginConfig {
    /// Resolve relative file paths against `base_dir`.
    pub fn resolve_paths(self, base_dir: &Path) -> Self {
        match self {
            LoginConfig::File {
                login_file,
                password_file,
                prompt_fallback,
            } => LoginConfig::File {
                login_file: resolve(base_dir, login_file),
                password_file: resolve(base_dir, password_file),
                prompt_fallback,
            },
            other => other,
        }
    }

    /// Build a login provider from this configuration.
    pub fn build(&self) -> Arc<dyn LoginProvider> {
        match self {
            LoginConfig::File {
                login_file,
                password_file,
                prompt_fallback,
            } => Arc::new(
                FileLoginProvider::new(login_file, password_file)
                    .with_prompt_fallback(*prompt_fallback),
            ),
            LoginConfig::Pass { config } => Arc::new(PassLoginProvider::new(config.clone())),
            LoginConfig::Prompt => build_prompt_provider(),
        }
    }
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(feature = "prompt")]
fn build_prompt_provider() -> Arc<dyn LoginProvider> {
    Arc::new(super::PromptLoginProvider)
}

// Without prompts, a file provider pointing at nothing reports a clear
// configuration error on first use.
#[cfg(not(feature = "prompt"))]
fn build_prompt_provider() -> Arc<dyn LoginProvider> {
    Arc::new(
        FileLoginProvider::new(default_login_file(), default_password_file())
            .with_prompt_fallback(false),
    )
}
