//! Step 3: token endpoint (authorization_code and refresh_token grants).

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use super::{parse_json_response, HubicClient, FORM_CONTENT_TYPE, TOKEN_PATH};
use crate::credentials::{mask_token, ClientCredentials};
use crate::error::{AuthError, AuthResult};
use crate::models::{TokenPair, DEFAULT_EXPIRES_IN};

/// `authorization_code` grant response; a refresh token is mandatory.
#[derive(Debug, Deserialize)]
struct CodeGrantResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// `refresh_token` grant response; the vendor may or may not rotate the
/// refresh token.
#[derive(Debug, Deserialize)]
struct RefreshGrantResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl HubicClient {
    /// Exchange an authorization code for an access/refresh token pair.
    ///
    /// `redirect_uri` must be the same (unencoded) URI used in the
    /// authorization request.
    pub async fn exchange_code(
        &self,
        client: &ClientCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenPair> {
        tracing::info!("Requesting access token");

        let body = format!(
            "code={}&redirect_uri={}&grant_type=authorization_code",
            urlencoding::encode(code),
            urlencoding::encode(redirect_uri),
        );
        let resp: CodeGrantResponse = self.post_token_form(client, body).await?;

        let tokens = TokenPair {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_in: resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            token_type: resp.token_type.unwrap_or_else(|| "Bearer".to_string()),
            obtained_at: self.clock.now(),
        };
        tracing::debug!(
            access_token = %mask_token(&tokens.access_token),
            expires_in = tokens.expires_in,
            "Obtained access token"
        );
        Ok(tokens)
    }

    /// Trade a refresh token for a new access token.
    ///
    /// If the vendor does not return a new refresh token, the one passed in
    /// is kept in the returned pair.
    pub async fn refresh_token(
        &self,
        client: &ClientCredentials,
        refresh_token: &str,
    ) -> AuthResult<TokenPair> {
        tracing::info!("Refreshing access token");

        let body = format!(
            "refresh_token={}&grant_type=refresh_token",
            urlencoding::encode(refresh_token),
        );
        let resp: RefreshGrantResponse = self.post_token_form(client, body).await?;

        Ok(TokenPair {
            access_token: resp.access_token,
            refresh_token: resp
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| refresh_token.to_string()),
            expires_in: resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            token_type: resp.token_type.unwrap_or_else(|| "Bearer".to_string()),
            obtained_at: self.clock.now(),
        })
    }

    async fn post_token_form<T: for<'de> Deserialize<'de>>(
        &self,
        client: &ClientCredentials,
        body: String,
    ) -> AuthResult<T> {
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(AUTHORIZATION, client.basic_auth_header())
            .body(body)
            .send()
            .await
            .map_err(AuthError::transport(TOKEN_PATH))?;

        parse_json_response(TOKEN_PATH, response).await
    }
}
