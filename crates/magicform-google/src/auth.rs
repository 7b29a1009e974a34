//! Token acquisition: load, refresh, or authorize.

use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::MagicformConfig;
use crate::error::AuthError;
use crate::loopback;
use crate::oauth::OAuthClient;
use crate::token::{TokenRecord, TokenStore};

/// Produces valid bearer tokens, refreshing and persisting them as needed.
pub struct Authenticator {
    oauth: OAuthClient,
    store: TokenStore,
    // Serializes refresh-and-save so concurrent callers don't interleave writes.
    lock: Mutex<()>,
}

impl Authenticator {
    pub fn new(oauth: OAuthClient, store: TokenStore) -> Self {
        Self {
            oauth,
            store,
            lock: Mutex::new(()),
        }
    }

    /// Build an authenticator from configuration.
    pub fn from_config(config: &MagicformConfig) -> Result<Self, AuthError> {
        let settings = config.client_settings()?;
        let oauth = OAuthClient::new(settings, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(oauth, TokenStore::new(&config.token_path)))
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return a valid stored token, refreshing it if it has expired.
    ///
    /// `Ok(None)` means there is nothing usable on disk and the user has to
    /// authorize. A rejected refresh token surfaces as
    /// [`AuthError::RefreshRejected`].
    pub async fn stored_token(&self) -> Result<Option<TokenRecord>, AuthError> {
        let _guard = self.lock.lock().await;

        let Some(record) = self.store.load()? else {
            tracing::debug!("no stored token at {}", self.store.path().display());
            return Ok(None);
        };
        if record.is_valid() {
            return Ok(Some(record));
        }
        if !record.can_refresh() {
            tracing::info!("stored token expired and has no refresh token");
            return Ok(None);
        }

        let refreshed = self.oauth.refresh(&record).await?;
        self.store.save(&refreshed)?;
        Ok(Some(refreshed))
    }

    /// Start an authorization: returns the consent URL and the `state` value
    /// the redirect must echo back.
    pub fn begin_authorization(&self, redirect_uri: &str) -> Result<(String, String), AuthError> {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = self.oauth.authorization_url(redirect_uri, &state)?;
        Ok((url, state))
    }

    /// Exchange an authorization code and persist the resulting token.
    pub async fn authorize_with_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        let record = self.oauth.exchange_code(code, redirect_uri).await?;
        let _guard = self.lock.lock().await;
        self.store.save(&record)?;
        Ok(record)
    }

    /// Run the installed-app flow on a loopback port.
    ///
    /// `show_url` is called with the consent URL once the listener is ready.
    pub async fn authorize_installed<F>(
        &self,
        port: u16,
        show_url: F,
    ) -> Result<TokenRecord, AuthError>
    where
        F: FnOnce(&str),
    {
        let listener = loopback::bind(port).await?;
        let redirect_uri = loopback::redirect_uri(&listener)?;
        let (url, state) = self.begin_authorization(&redirect_uri)?;
        show_url(&url);

        let code = loopback::wait_for_code(&listener, &state).await?;
        self.authorize_with_code(&code, &redirect_uri).await
    }

    /// Return a valid token, falling back to the installed-app flow when
    /// nothing usable is stored or the refresh token was rejected.
    pub async fn token_or_authorize<F>(
        &self,
        port: u16,
        show_url: F,
    ) -> Result<TokenRecord, AuthError>
    where
        F: FnOnce(&str),
    {
        match self.stored_token().await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => {}
            Err(e) if e.requires_reauthorization() => {
                tracing::warn!("{e}");
                self.store.remove()?;
            }
            Err(e) => return Err(e),
        }
        self.authorize_installed(port, show_url).await
    }
}
