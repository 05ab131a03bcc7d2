//! Step 4: object-storage credentials.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};

use super::{parse_json_response, HubicClient, CREDENTIALS_PATH, FORM_CONTENT_TYPE};
use crate::credentials::mask_token;
use crate::error::{AuthError, AuthResult};
use crate::models::StorageCredentials;

impl HubicClient {
    /// Fetch the storage token and endpoint with an API access token.
    ///
    /// 401/403 (invalid, expired, revoked or deleted token) surface as
    /// [`AuthError::TokenInvalid`].
    pub async fn fetch_storage_credentials(&self, access_token: &str) -> AuthResult<StorageCredentials> {
        tracing::info!("Requesting storage credentials");
        tracing::debug!(access_token = %mask_token(access_token), "Using bearer token");

        let response = self
            .client
            .get(self.url(CREDENTIALS_PATH))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(AuthError::transport(CREDENTIALS_PATH))?;

        let credentials: StorageCredentials = parse_json_response(CREDENTIALS_PATH, response).await?;

        if credentials.token.is_empty() || Url::parse(&credentials.endpoint).is_err() {
            return Err(AuthError::malformed(
                CREDENTIALS_PATH,
                StatusCode::OK,
                "storage credentials need a token and an absolute endpoint URL",
                format!("{credentials:?}"),
            ));
        }

        tracing::debug!(
            endpoint = %credentials.endpoint,
            token = %mask_token(&credentials.token),
            "Obtained storage credentials"
        );
        Ok(credentials)
    }
}
