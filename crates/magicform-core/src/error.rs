//! Forms API error types.
//!
//! These error types represent failures when talking to the remote forms
//! service. Defined in `magicform-core` so the form builder can downcast and
//! classify errors for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with the forms service.
#[derive(Debug, Error)]
pub enum FormsError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (missing, expired or revoked bearer token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The token lacks the scope or the user lacks access to the form.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested form does not exist.
    #[error("form not found: {0}")]
    FormNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl FormsError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            FormsError::AuthenticationFailed(_)
                | FormsError::PermissionDenied(_)
                | FormsError::FormNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            FormsError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors() {
        assert!(FormsError::AuthenticationFailed("expired".into()).is_permanent());
        assert!(FormsError::FormNotFound("abc".into()).is_permanent());
        assert!(!FormsError::RateLimited { retry_after_ms: 10 }.is_permanent());
        assert!(!FormsError::NetworkError("reset".into()).is_permanent());
    }

    #[test]
    fn retry_hint_only_for_rate_limit() {
        assert_eq!(
            FormsError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
        assert_eq!(FormsError::Timeout(30).retry_after_ms(), None);
    }
}
