//! hubiC API client using raw HTTP requests.
//!
//! Each step of the authorization-code flow is one method on [`HubicClient`]:
//!
//! 1. [`HubicClient::request_form_token`]: GET `oauth/auth/`, scrape the
//!    hidden `oauth` input from the login page.
//! 2. [`HubicClient::submit_login`]: POST the login form, follow the redirect
//!    and read the authorization code from its query string.
//! 3. [`HubicClient::exchange_code`] / [`HubicClient::refresh_token`]:
//!    POST `oauth/token/` with Basic client authentication.
//! 4. [`HubicClient::fetch_storage_credentials`]: GET
//!    `1.0/account/credentials` with the bearer token.
//!
//! The vendor only accepts `application/x-www-form-urlencoded`, and every
//! request (GETs included) carries that content type.

mod authorize;
mod login;
mod scope;
mod storage;
mod token;

pub use authorize::{extract_form_token, generate_state, AuthorizationRequest, STATE_LEN};
pub use login::{login_form_body, parse_redirect};
pub use scope::{Scope, DEFAULT_SCOPE};

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, AuthResult};

/// Production API base.
pub const API_BASE: &str = "https://api.hubic.com/";

/// Applied to every request; the vendor documents no timeout of its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub(crate) const AUTH_PATH: &str = "oauth/auth/";
pub(crate) const TOKEN_PATH: &str = "oauth/token/";
pub(crate) const CREDENTIALS_PATH: &str = "1.0/account/credentials";

/// hubiC API client.
#[derive(Clone)]
pub struct HubicClient {
    client: Client,
    api_base: String,
    clock: Arc<dyn Clock>,
}

impl HubicClient {
    /// Client for the production API with the default timeout.
    pub fn new() -> AuthResult<Self> {
        Self::with_base_url(API_BASE, DEFAULT_TIMEOUT)
    }

    /// Client for an alternate API base (tests, proxies).
    pub fn with_base_url(api_base: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("pubic/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .build()
            .map_err(|err| AuthError::Configuration(format!("failed to create HTTP client: {err}")))?;

        let mut api_base = api_base.into();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        Ok(Self {
            client,
            api_base,
            clock: Arc::new(SystemClock),
        })
    }

    /// Clock used to stamp freshly issued token pairs.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

/// Read a JSON body, classifying non-success statuses first.
pub(crate) async fn parse_json_response<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> AuthResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(AuthError::transport(endpoint))?;

    tracing::debug!(endpoint, status = status.as_u16(), "Received response");

    if !status.is_success() {
        return Err(AuthError::from_status(endpoint, status, body));
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(err) => Err(AuthError::malformed(
            endpoint,
            status,
            format!("unexpected JSON body: {err}"),
            body,
        )),
    }
}
