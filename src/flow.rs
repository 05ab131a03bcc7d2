//! Top-level orchestration: cache gate, then the authorization steps in order.

use std::sync::Arc;

use crate::cache::{CredentialCache, JsonFileCache};
use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::credentials::{ClientCredentials, LoginProvider};
use crate::error::{AuthError, AuthResult};
use crate::hubic::{AuthorizationRequest, HubicClient, Scope, API_BASE};
use crate::models::{StorageCredentials, TokenPair};

/// Runs the hubiC authorization-code flow, consulting a credential cache
/// first and saving whatever it fetches.
///
/// Every full attempt starts from a fresh authorization request; form
/// tokens and codes are never reused across attempts.
pub struct AuthFlow {
    client: HubicClient,
    client_credentials: ClientCredentials,
    login: Arc<dyn LoginProvider>,
    cache: Arc<dyn CredentialCache>,
    clock: Arc<dyn Clock>,
    redirect_uri: String,
    scope: Scope,
    verify_state: bool,
}

impl AuthFlow {
    pub fn new(
        client: HubicClient,
        client_credentials: ClientCredentials,
        login: Arc<dyn LoginProvider>,
        cache: Arc<dyn CredentialCache>,
    ) -> Self {
        Self {
            client,
            client_credentials,
            login,
            cache,
            clock: Arc::new(SystemClock),
            redirect_uri: API_BASE.to_string(),
            scope: Scope::default(),
            verify_state: true,
        }
    }

    /// Build the flow described by a configuration file: client credentials
    /// from their files, the configured login backend and a JSON file cache.
    pub fn from_config(config: &ResolvedConfig) -> AuthResult<Self> {
        let client = HubicClient::with_base_url(config.api_base.clone(), config.timeout)?;
        let client_credentials =
            ClientCredentials::load(&config.client_id_file, &config.client_secret_file)?;
        let cache: Arc<dyn CredentialCache> = Arc::new(JsonFileCache::with_path(&config.cache_dir));

        Ok(Self::new(client, client_credentials, config.login.build(), cache)
            .with_redirect_uri(config.redirect_uri.clone())
            .with_scope(config.scope.clone())
            .with_verify_state(config.verify_state))
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Disable to accept redirects whose echoed `state` differs from the one sent.
    pub fn with_verify_state(mut self, verify: bool) -> Self {
        self.verify_state = verify;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        // Keep issued-at stamps and expiry checks on the same clock.
        self.client = self.client.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<dyn CredentialCache> {
        &self.cache
    }

    /// Return an access/refresh token pair, running the authorization flow
    /// only when the cache cannot supply a usable one.
    ///
    /// An expired cached pair is refreshed first; if the vendor rejects the
    /// refresh token the full flow runs instead.
    pub async fn get_api_credentials(&self, use_cache: bool) -> AuthResult<TokenPair> {
        if use_cache {
            if let Some(tokens) = self.cache.load_api_credentials().await.map_err(AuthError::Cache)? {
                if !tokens.is_expired(self.clock.as_ref()) {
                    tracing::debug!("Using cached API credentials");
                    return Ok(tokens);
                }

                tracing::info!(expired_at = %tokens.expires_at(), "Cached access token expired");
                match self.refresh(&tokens).await {
                    Ok(refreshed) => return Ok(refreshed),
                    Err(err @ (AuthError::TokenInvalid { .. } | AuthError::InvalidRequest { .. })) => {
                        tracing::warn!(error = %err, "Refresh rejected, re-authorizing");
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        tracing::info!("No usable API credentials available, starting OAuth2 authorization");
        let tokens = self.authorize().await?;
        self.cache
            .save_api_credentials(&tokens)
            .await
            .map_err(AuthError::Cache)?;
        Ok(tokens)
    }

    /// Return storage credentials, fetching them (and API credentials if
    /// needed) only when the cache has none that are still valid.
    pub async fn get_storage_credentials(&self, use_cache: bool) -> AuthResult<StorageCredentials> {
        if use_cache {
            if let Some(credentials) = self
                .cache
                .load_storage_credentials()
                .await
                .map_err(AuthError::Cache)?
            {
                if !credentials.is_expired(self.clock.as_ref()) {
                    tracing::debug!("Using cached storage credentials");
                    return Ok(credentials);
                }
                tracing::info!("Cached storage credentials expired");
            }
        }

        tracing::info!("No cached storage credentials available");
        let tokens = self.get_api_credentials(use_cache).await?;
        let credentials = self
            .client
            .fetch_storage_credentials(&tokens.access_token)
            .await?;
        self.cache
            .save_storage_credentials(&credentials)
            .await
            .map_err(AuthError::Cache)?;
        Ok(credentials)
    }

    /// Force the refresh grant on the cached token pair.
    pub async fn refresh_api_credentials(&self) -> AuthResult<TokenPair> {
        let tokens = self
            .cache
            .load_api_credentials()
            .await
            .map_err(AuthError::Cache)?
            .ok_or_else(|| {
                AuthError::Configuration("no cached API credentials to refresh".to_string())
            })?;
        self.refresh(&tokens).await
    }

    async fn refresh(&self, tokens: &TokenPair) -> AuthResult<TokenPair> {
        let refreshed = self
            .client
            .refresh_token(&self.client_credentials, &tokens.refresh_token)
            .await?;
        self.cache
            .save_api_credentials(&refreshed)
            .await
            .map_err(AuthError::Cache)?;
        Ok(refreshed)
    }

    /// Steps 1-3: form token, login/consent, code exchange.
    async fn authorize(&self) -> AuthResult<TokenPair> {
        let request = AuthorizationRequest::new(self.redirect_uri.clone(), self.scope.clone());

        let form_token = self
            .client
            .request_form_token(self.client_credentials.client_id(), &request)
            .await?;

        let user = self.login.user_credentials()?;
        let grant = self
            .client
            .submit_login(&form_token, &request.scope, &user)
            .await?;

        if self.verify_state {
            grant.verify_state(&request.state)?;
        } else if grant.state.as_deref() != Some(request.state.as_str()) {
            tracing::warn!("Redirect state does not match request state; verification disabled");
        }

        self.client
            .exchange_code(&self.client_credentials, &grant.code, &request.redirect_uri)
            .await
    }
}
