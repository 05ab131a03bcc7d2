//! Client and user credential sources.
//!
//! The client id/secret pair identifies the registered hubiC application and
//! is read once from configuration. The user's login and password are
//! supplied by a [`LoginProvider`], selected through the `[login]` table of
//! the config file:
//!
//! ```toml
//! [login]
//! backend = "file"
//! login_file = "user_login.txt"
//! password_file = "user_password.txt"
//! ```
//!
//! Secrets are held in [`SecretString`] and only ever logged through
//! [`mask_secret`] / [`mask_token`].

mod config;
mod files;
mod pass;
#[cfg(feature = "prompt")]
mod prompt;

pub use config::LoginConfig;
pub use files::{read_first_line, FileLoginProvider};
pub use pass::{PassConfig, PassLoginProvider};
#[cfg(feature = "prompt")]
pub use prompt::PromptLoginProvider;

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

const TOKEN_MASK_PREFIX_LEN: usize = 6;
const TOKEN_MASK_SUFFIX_LEN: usize = 4;

/// Length-only mask for passwords and client secrets.
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

/// Mask a bearer-style token, keeping a short prefix and suffix for
/// recognizability.
pub fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();
    if len <= TOKEN_MASK_PREFIX_LEN + TOKEN_MASK_SUFFIX_LEN {
        return "*".repeat(len.min(8));
    }

    let prefix: String = chars[..TOKEN_MASK_PREFIX_LEN].iter().collect();
    let suffix: String = chars[len - TOKEN_MASK_SUFFIX_LEN..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// `token` as-is when `reveal` is set, otherwise [`mask_token`]ed.
pub fn display_token(token: &str, reveal: bool) -> Cow<'_, str> {
    if reveal {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(mask_token(token))
    }
}

/// Registered application credentials.
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Load the client id and secret from the first line of each file.
    pub fn load(client_id_file: &Path, client_secret_file: &Path) -> AuthResult<Self> {
        let client_id = read_first_line(client_id_file)?.ok_or_else(|| {
            AuthError::Configuration(format!(
                "client id file not found: {}",
                client_id_file.display()
            ))
        })?;
        tracing::debug!(file = %client_id_file.display(), client_id = %client_id, "Loaded client id");

        let client_secret = read_first_line(client_secret_file)?.ok_or_else(|| {
            AuthError::Configuration(format!(
                "client secret file not found: {}",
                client_secret_file.display()
            ))
        })?;
        tracing::debug!(
            file = %client_secret_file.display(),
            client_secret = %mask_secret(&client_secret),
            "Loaded client secret"
        );

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AuthError::Configuration(
                "client id and client secret must not be empty".to_string(),
            ));
        }

        Ok(Self::new(client_id, client_secret))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `Authorization` header value: `Basic base64(client_id:client_secret)`.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret.expose_secret());
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask_secret(self.client_secret.expose_secret()))
            .finish()
    }
}

/// hubiC account login and password.
pub struct UserCredentials {
    pub login: String,
    pub password: SecretString,
}

impl UserCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("login", &self.login)
            .field("password", &mask_secret(self.password.expose_secret()))
            .finish()
    }
}

/// Source of the user's login and password.
///
/// Called once per full authorization attempt, never when cached
/// credentials satisfy the request.
pub trait LoginProvider: Send + Sync {
    fn user_credentials(&self) -> AuthResult<UserCredentials>;
}

/// Fixed login/password, for embedding and tests.
pub struct StaticLoginProvider {
    login: String,
    password: SecretString,
}

impl StaticLoginProvider {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl LoginProvider for StaticLoginProvider {
    fn user_credentials(&self) -> AuthResult<UserCredentials> {
        Ok(UserCredentials::new(
            self.login.clone(),
            self.password.expose_secret().to_string(),
        ))
    }
}
