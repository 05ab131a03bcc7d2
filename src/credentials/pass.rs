//! Password-store (pass) login backend.
//!
//! The entry's first line is the hubiC password; the login is read from a
//! `login: ...` field (field name configurable).

use std::collections::HashMap;
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::{LoginProvider, UserCredentials};
use crate::error::{AuthError, AuthResult};

fn default_login_field() -> String {
    "login".to_string()
}

/// Configuration for a pass-backed login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// The pass entry path (e.g., "web/hubic.com").
    pub path: String,

    /// Field holding the login inside the entry.
    #[serde(default = "default_login_field")]
    pub login_field: String,
}

/// Login provider backed by password-store (pass).
pub struct PassLoginProvider {
    config: PassConfig,
}

impl PassLoginProvider {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    /// Create a provider for an entry path, using the default `login` field.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self::new(PassConfig {
            path: path.into(),
            login_field: default_login_field(),
        })
    }

    fn read_entry(&self) -> AuthResult<PassEntry> {
        let output = Command::new("pass")
            .arg("show")
            .arg(&self.config.path)
            .output()
            .map_err(|err| AuthError::Configuration(format!("failed to run pass: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::Configuration(format!(
                "pass show {} failed: {}",
                self.config.path,
                stderr.trim()
            )));
        }

        let content = String::from_utf8(output.stdout)
            .map_err(|_| AuthError::Configuration("invalid UTF-8 in pass output".to_string()))?;

        Ok(PassEntry::parse(&content))
    }
}

impl LoginProvider for PassLoginProvider {
    fn user_credentials(&self) -> AuthResult<UserCredentials> {
        let entry = self.read_entry()?;
        entry.user_credentials(&self.config.login_field).ok_or_else(|| {
            AuthError::Configuration(format!(
                "pass entry {} needs a password line and a `{}:` field",
                self.config.path, self.config.login_field
            ))
        })
    }
}

/// Parsed pass entry.
#[derive(Debug, Default)]
struct PassEntry {
    /// The first line (traditionally the password).
    password: Option<String>,
    /// Additional fields in `name: value` format.
    fields: HashMap<String, String>,
}

impl PassEntry {
    fn parse(content: &str) -> Self {
        let mut lines = content.lines();
        let password = lines
            .next()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty());
        let fields = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(key, value)| (key.trim().to_string(), value.to_string()))
            .collect();

        Self { password, fields }
    }

    fn user_credentials(&self, login_field: &str) -> Option<UserCredentials> {
        let password = self.password.as_ref()?;
        let login = self.fields.get(login_field)?;
        Some(UserCredentials::new(login.clone(), password.clone()))
    }
}
