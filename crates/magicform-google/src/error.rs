//! OAuth error types.

use thiserror::Error;

/// Errors that can occur while acquiring, refreshing or storing tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No OAuth client id/secret could be found in config, env or secrets file.
    #[error("missing OAuth client secrets: {0}")]
    MissingClientSecrets(String),

    /// The token endpoint rejected a request.
    #[error("token endpoint error (HTTP {status}): {error}: {description}")]
    TokenEndpoint {
        status: u16,
        error: String,
        description: String,
    },

    /// The refresh token was rejected; the user must authorize again.
    #[error("refresh token rejected, re-authorization required: {0}")]
    RefreshRejected(String),

    /// The user declined consent or the provider returned an error redirect.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// The `state` parameter on the redirect did not match the request.
    #[error("authorization state mismatch")]
    StateMismatch,

    /// A URL could not be built or parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A network error occurred talking to the token endpoint.
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns `true` if the user has to go through the consent screen again.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, AuthError::RefreshRejected(_))
    }
}
