//! Interactive login/password prompts on stderr.

use dialoguer::console::Term;
use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};

use super::{LoginProvider, UserCredentials};
use crate::error::{AuthError, AuthResult};

fn prompt_error(err: dialoguer::Error) -> AuthError {
    AuthError::Prompt(std::io::Error::other(err.to_string()))
}

pub(super) fn prompt_login() -> AuthResult<String> {
    Input::<String>::new()
        .with_prompt("login")
        .interact_text_on(&Term::stderr())
        .map_err(prompt_error)
}

pub(super) fn prompt_password() -> AuthResult<SecretString> {
    let password = Password::new()
        .with_prompt("password")
        .interact_on(&Term::stderr())
        .map_err(prompt_error)?;
    Ok(SecretString::from(password))
}

/// Always asks on the terminal.
#[derive(Debug, Clone, Default)]
pub struct PromptLoginProvider;

impl LoginProvider for PromptLoginProvider {
    fn user_credentials(&self) -> AuthResult<UserCredentials> {
        let login = prompt_login()?;
        let password = prompt_password()?;
        Ok(UserCredentials::new(login, password.expose_secret().to_string()))
    }
}
