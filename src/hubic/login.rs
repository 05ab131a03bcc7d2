//! Step 2: login and consent.

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};

use super::{HubicClient, Scope, AUTH_PATH, FORM_CONTENT_TYPE};
use crate::credentials::{mask_secret, UserCredentials};
use crate::error::{AuthError, AuthResult};
use crate::models::{AuthorizationGrant, FormToken};

/// Login form body, in the field order the vendor's own form uses:
/// `oauth`, `action`, one field per permission, `login`, `user_pwd`.
///
/// Returned as a secret since it embeds the password.
pub fn login_form_body(token: &FormToken, scope: &Scope, user: &UserCredentials) -> SecretString {
    SecretString::from(format!(
        "oauth={}&action=accepted&{}&login={}&user_pwd={}",
        token.as_str(),
        scope.form_fragment(),
        urlencoding::encode(&user.login),
        urlencoding::encode(user.password.expose_secret()),
    ))
}

/// Read the outcome of the login redirect from its query string.
///
/// Returns `Ok(None)` when the URL carries neither `code` nor `error`, which
/// happens when the vendor re-renders the login page instead of redirecting.
pub fn parse_redirect(url: &Url) -> AuthResult<Option<AuthorizationGrant>> {
    let mut code = None;
    let mut scope = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "scope" => scope = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::AuthorizationDenied {
            error,
            description: description.unwrap_or_default(),
        });
    }

    Ok(code.map(|code| AuthorizationGrant { code, scope, state }))
}

impl HubicClient {
    /// Submit the login form and return the authorization code from the
    /// redirect target.
    pub async fn submit_login(
        &self,
        token: &FormToken,
        scope: &Scope,
        user: &UserCredentials,
    ) -> AuthResult<AuthorizationGrant> {
        tracing::info!("Submitting login and consent");
        tracing::debug!(
            login = %user.login,
            password = %mask_secret(user.password.expose_secret()),
            scope = %scope,
            "Sending login request"
        );

        let body = login_form_body(token, scope, user);
        let sent = self
            .client
            .post(self.url(AUTH_PATH))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body.expose_secret().to_string())
            .send()
            .await;

        // An unreachable redirect target (a localhost callback) still
        // carries the code in the URL reqwest was following.
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                if let Some(grant) = err.url().map(parse_redirect).transpose()?.flatten() {
                    tracing::debug!("Redirect target unreachable, using the code from its URL");
                    return Ok(grant);
                }
                return Err(AuthError::Transport {
                    endpoint: AUTH_PATH,
                    source: err,
                });
            }
        };

        let status = response.status();
        let final_url = response.url().clone();
        tracing::debug!(
            status = status.as_u16(),
            redirect = %format_args!("{}{}", final_url.origin().ascii_serialization(), final_url.path()),
            "Login response received"
        );

        if let Some(grant) = parse_redirect(&final_url)? {
            return Ok(grant);
        }

        let body = response
            .text()
            .await
            .map_err(AuthError::transport(AUTH_PATH))?;
        if status.is_server_error() {
            return Err(AuthError::from_status(AUTH_PATH, status, body));
        }

        Err(AuthError::malformed(
            AUTH_PATH,
            status,
            "login did not redirect with an authorization code",
            body,
        ))
    }
}
