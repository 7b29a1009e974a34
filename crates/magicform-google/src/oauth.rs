//! OAuth2 authorization-code and refresh grants against Google.

use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use tracing::instrument;

use crate::config::OAuthSettings;
use crate::error::AuthError;
use crate::token::TokenRecord;

/// Talks to the consent screen and token endpoint for one OAuth client.
pub struct OAuthClient {
    settings: OAuthSettings,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Deserialize, Default)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

impl OAuthClient {
    pub fn new(settings: OAuthSettings, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Build the consent-screen URL the user has to visit.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        let scope = self.settings.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.settings.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(format!("{}: {e}", self.settings.auth_uri)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a token record.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
        ];
        let response = self.post_token(&self.settings.token_uri, &params).await?;

        tracing::info!("exchanged authorization code for tokens");
        Ok(self.record_from(response, None))
    }

    /// Refresh an expired record. The old refresh token is kept when the
    /// endpoint does not rotate it.
    #[instrument(skip_all)]
    pub async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, AuthError> {
        let Some(refresh_token) = record.refresh_token.as_deref() else {
            return Err(AuthError::RefreshRejected("no refresh token stored".into()));
        };

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", record.client_id.as_str()),
            ("client_secret", record.client_secret.as_str()),
        ];
        let response = match self.post_token(&record.token_uri, &params).await {
            Ok(response) => response,
            Err(AuthError::TokenEndpoint {
                error, description, ..
            }) if error == "invalid_grant" => {
                return Err(AuthError::RefreshRejected(description));
            }
            Err(e) => return Err(e),
        };

        tracing::info!("refreshed access token");
        let mut refreshed = self.record_from(response, Some(record));
        refreshed.token_uri = record.token_uri.clone();
        refreshed.client_id = record.client_id.clone();
        refreshed.client_secret = record.client_secret.clone();
        Ok(refreshed)
    }

    async fn post_token(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let parsed: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status,
                error: if parsed.error.is_empty() {
                    "unknown_error".into()
                } else {
                    parsed.error
                },
                description: if parsed.error_description.is_empty() {
                    body
                } else {
                    parsed.error_description
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::NetworkError(format!("failed to parse token response: {e}")))
    }

    fn record_from(&self, response: TokenResponse, previous: Option<&TokenRecord>) -> TokenRecord {
        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => previous
                .map(|p| p.scopes.clone())
                .unwrap_or_else(|| self.settings.scopes.clone()),
        };

        TokenRecord {
            token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            token_uri: self.settings.token_uri.clone(),
            client_id: self.settings.client_id.clone(),
            client_secret: self.settings.client_secret.clone(),
            scopes,
            expiry: response
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        }
    }
}
