//! Step 1: authorization code request.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;

use super::{HubicClient, Scope, AUTH_PATH, FORM_CONTENT_TYPE};
use crate::error::{AuthError, AuthResult};
use crate::models::FormToken;

/// Length of the generated anti-forgery state.
pub const STATE_LEN: usize = 16;

const STATE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random ASCII-letter string used as the OAuth `state` parameter.
pub fn generate_state(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| STATE_ALPHABET[rng.gen_range(0..STATE_ALPHABET.len())] as char)
        .collect()
}

/// Parameters of one authorization attempt. Discarded once the code is obtained.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Redirect URI, unencoded.
    pub redirect_uri: String,
    pub scope: Scope,
    pub state: String,
}

impl AuthorizationRequest {
    /// New attempt with a freshly generated state.
    pub fn new(redirect_uri: impl Into<String>, scope: Scope) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            scope,
            state: generate_state(STATE_LEN),
        }
    }

    pub fn encoded_redirect_uri(&self) -> String {
        urlencoding::encode(&self.redirect_uri).into_owned()
    }
}

fn input_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<input\b([^>]*)>").expect("static regex is valid"))
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("static regex is valid")
    })
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Find the `value` of the first `<input name="oauth">` in a login page.
pub fn extract_form_token(html: &str) -> Option<FormToken> {
    input_tag_regex()
        .captures_iter(html)
        .filter_map(|tag| {
            let attributes = tag.get(1)?.as_str();
            let mut name = None;
            let mut value = None;
            for attr in attribute_regex().captures_iter(attributes) {
                let key = attr.get(1)?.as_str().to_ascii_lowercase();
                let raw = attr.get(2).or(attr.get(3)).or(attr.get(4))?.as_str();
                match key.as_str() {
                    "name" => name = Some(raw.to_string()),
                    "value" => value = Some(decode_entities(raw)),
                    _ => {}
                }
            }
            match (name.as_deref(), value) {
                (Some("oauth"), Some(value)) if !value.is_empty() => Some(FormToken::new(value)),
                _ => None,
            }
        })
        .next()
}

impl HubicClient {
    /// Open the authorization page and return the login form token.
    pub async fn request_form_token(
        &self,
        client_id: &str,
        request: &AuthorizationRequest,
    ) -> AuthResult<FormToken> {
        tracing::info!("Requesting authorization code");

        let url = format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}",
            self.url(AUTH_PATH),
            urlencoding::encode(client_id),
            request.encoded_redirect_uri(),
            request.scope,
            request.state,
        );
        tracing::debug!(url = %url, "Sending authorization request");

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await
            .map_err(AuthError::transport(AUTH_PATH))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(AuthError::transport(AUTH_PATH))?;
        tracing::debug!(status = status.as_u16(), "Parsing login page for form token");

        if status.is_server_error() {
            return Err(AuthError::from_status(AUTH_PATH, status, body));
        }

        match extract_form_token(&body) {
            Some(token) => {
                tracing::debug!(form_token = token.as_str(), "Found login form token");
                Ok(token)
            }
            None => Err(AuthError::malformed(
                AUTH_PATH,
                status,
                "login page has no `oauth` form field",
                body,
            )),
        }
    }
}
