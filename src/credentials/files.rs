//! Plain-file credential sources (`client_id.txt`, `user_login.txt`, ...).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use super::{mask_secret, LoginProvider, UserCredentials};
use crate::error::{AuthError, AuthResult};

/// Read the first line of a file, without its line terminator.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn read_first_line(path: &Path) -> AuthResult<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(AuthError::Configuration(format!(
                "failed to read {}: {err}",
                path.display()
            )))
        }
    };

    let line = content.lines().next().unwrap_or_default();
    Ok(Some(line.trim_end_matches('\r').to_string()))
}

/// Reads the login and password from the first line of two files.
///
/// A missing file falls back to an interactive prompt when
/// `prompt_fallback` is set (and the `prompt` feature is enabled); otherwise
/// it is a configuration error.
#[derive(Debug, Clone)]
pub struct FileLoginProvider {
    login_file: PathBuf,
    password_file: PathBuf,
    prompt_fallback: bool,
}

impl FileLoginProvider {
    pub fn new(login_file: impl Into<PathBuf>, password_file: impl Into<PathBuf>) -> Self {
        Self {
            login_file: login_file.into(),
            password_file: password_file.into(),
            prompt_fallback: true,
        }
    }

    pub fn with_prompt_fallback(mut self, enabled: bool) -> Self {
        self.prompt_fallback = enabled;
        self
    }

    fn login(&self) -> AuthResult<String> {
        if let Some(login) = read_first_line(&self.login_file)? {
            tracing::debug!(file = %self.login_file.display(), login = %login, "Using login from file");
            return Ok(login);
        }
        self.ensure_prompt_allowed(&self.login_file)?;
        prompt_login_impl()
    }

    fn password(&self) -> AuthResult<SecretString> {
        if let Some(password) = read_first_line(&self.password_file)? {
            tracing::debug!(
                file = %self.password_file.display(),
                password = %mask_secret(&password),
                "Using password from file"
            );
            return Ok(SecretString::from(password));
        }
        self.ensure_prompt_allowed(&self.password_file)?;
        prompt_password_impl()
    }

    fn ensure_prompt_allowed(&self, missing: &Path) -> AuthResult<()> {
        if self.prompt_fallback {
            tracing::debug!(file = %missing.display(), "Credential file missing, prompting");
            return Ok(());
        }
        Err(AuthError::Configuration(format!(
            "credential file not found: {}",
            missing.display()
        )))
    }
}

#[cfg(feature = "prompt")]
fn prompt_login_impl() -> AuthResult<String> {
    super::prompt::prompt_login()
}

#[cfg(not(feature = "prompt"))]
fn prompt_login_impl() -> AuthResult<String> {
    Err(AuthError::Configuration(
        "login file missing and interactive prompts are disabled in this build".to_string(),
    ))
}

#[cfg(feature = "prompt")]
fn prompt_password_impl() -> AuthResult<SecretString> {
    super::prompt::prompt_password()
}

#[cfg(not(feature = "prompt"))]
fn prompt_password_impl() -> AuthResult<SecretString> {
    Err(AuthError::Configuration(
        "password file missing and interactive prompts are disabled in this build".to_string(),
    ))
}

impl LoginProvider for FileLoginProvider {
    fn user_credentials(&self) -> AuthResult<UserCredentials> {
        let login = self.login()?;
        let password = self.password()?;
        Ok(UserCredentials::new(login, password.expose_secret().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_first_line_strips_crlf() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("client_id.txt");
        let mut file = std::fs::File::create(&path)?;
        write!(file, "api_hubic_123\r\nsecond line\r\n")?;

        assert_eq!(read_first_line(&path)?, Some("api_hubic_123".to_string()));
        assert_eq!(read_first_line(&dir.path().join("missing.txt"))?, None);
        Ok(())
    }

    #[test]
    fn test_file_provider_reads_both_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("user_login.txt"), "me@example.com\n")?;
        std::fs::write(dir.path().join("user_password.txt"), "p@ss word&1\n")?;

        let provider = FileLoginProvider::new(
            dir.path().join("user_login.txt"),
            dir.path().join("user_password.txt"),
        )
        .with_prompt_fallback(false);
        let creds = provider.user_credentials()?;

        assert_eq!(creds.login, "me@example.com");
        assert_eq!(creds.password.expose_secret(), "p@ss word&1");
        Ok(())
    }

    #[test]
    fn test_missing_file_without_fallback_is_configuration_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("user_login.txt"), "me@example.com\n")?;

        let provider = FileLoginProvider::new(
            dir.path().join("user_login.txt"),
            dir.path().join("user_password.txt"),
        )
        .with_prompt_fallback(false);

        let err = provider.user_credentials().unwrap_err();
        assert!(matches!(err, AuthError::Configuration(ref msg) if msg.contains("user_password.txt")));
        Ok(())
    }
}
