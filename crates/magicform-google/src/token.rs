//! OAuth token record and its on-disk store.
//!
//! The file layout matches Google's "authorized user" JSON so token files
//! written by other Google client libraries can be reused.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Tokens are treated as expired this many seconds before their expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A bearer token plus everything needed to refresh it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The access token.
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl TokenRecord {
    /// Whether the access token has expired (within the skew) at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS))
    }

    /// Whether the access token can be used right now.
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.is_expired_at(Utc::now())
    }

    /// Whether the record can be refreshed without user interaction.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Reads and writes the token file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token.
    ///
    /// A missing file yields `None`. A file that cannot be parsed is removed
    /// and also yields `None`, so the caller falls back to authorization.
    pub fn load(&self) -> Result<Option<TokenRecord>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    "error loading credentials from {}: {e}; removing invalid token file",
                    self.path.display()
                );
                self.remove()?;
                Ok(None)
            }
        }
    }

    /// Persist a token record as pretty JSON.
    pub fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("saved token to {}", self.path.display());
        Ok(())
    }

    /// Delete the token file if it exists.
    pub fn remove(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiry: Option<DateTime<Utc>>) -> TokenRecord {
        TokenRecord {
            token: "ya29.access".into(),
            refresh_token: Some("1//refresh".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            scopes: vec!["https://www.googleapis.com/auth/drive".into()],
            expiry,
        }
    }

    #[test]
    fn expiry_with_skew() {
        let now = Utc::now();
        assert!(!record(None).is_expired_at(now));
        assert!(!record(Some(now + Duration::minutes(10))).is_expired_at(now));
        assert!(record(Some(now + Duration::seconds(30))).is_expired_at(now));
        assert!(record(Some(now - Duration::minutes(1))).is_expired_at(now));
    }

    #[test]
    fn validity_requires_token() {
        let mut r = record(None);
        assert!(r.is_valid());
        r.token.clear();
        assert!(!r.is_valid());
    }

    #[test]
    fn reads_google_authorized_user_file() {
        let json = r#"{
            "token": "ya29.a0",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "cid",
            "client_secret": "cs",
            "scopes": ["https://www.googleapis.com/auth/drive"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2030-01-01T10:00:00.123456Z"
        }"#;
        let r: TokenRecord = serde_json::from_str(json).unwrap();
        assert!(r.can_refresh());
        assert!(r.expiry.is_some());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        assert!(store.load().unwrap().is_none());

        let r = record(Some(Utc::now() + Duration::hours(1)));
        store.save(&r).unwrap();
        assert_eq!(store.load().unwrap(), Some(r));
    }

    #[test]
    fn invalid_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ garbage").unwrap();

        let store = TokenStore::new(&path);
        assert!(store.load().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn debug_masks_tokens() {
        let printed = format!("{:?}", record(None));
        assert!(!printed.contains("ya29.access"));
        assert!(!printed.contains("1//refresh"));
        assert!(!printed.contains("csecret"));
    }
}
