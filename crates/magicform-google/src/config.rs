//! magicform configuration and OAuth client secrets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use magicform_core::builder::FormBuilderConfig;

use crate::error::AuthError;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_FORMS_BASE_URL: &str = "https://forms.googleapis.com";
/// Scope requested by default. Drive access covers creating and editing forms.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// OAuth client settings.
///
/// Note: Custom Debug impl masks the client secret to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Redirect URL registered for the hosted web variant.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
            redirect_uri: None,
            scopes: default_scopes(),
        }
    }
}

impl OAuthSettings {
    fn has_client(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}
fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
fn default_scopes() -> Vec<String> {
    vec![DRIVE_SCOPE.to_string()]
}

/// Top-level magicform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicformConfig {
    /// OAuth client settings.
    #[serde(default)]
    pub oauth: OAuthSettings,
    /// Google `client_secret.json` used when `[oauth]` has no client.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Where the OAuth token record is stored.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    /// Forms API base URL.
    #[serde(default = "default_forms_base_url")]
    pub forms_base_url: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Max createItem requests per batch update (0 = all in one batch).
    #[serde(default)]
    pub max_batch_size: usize,
    /// Max retries on rate-limited or server errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Loopback port for the installed-app flow.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}
fn default_forms_base_url() -> String {
    DEFAULT_FORMS_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    60
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_port() -> u16 {
    8000
}

impl Default for MagicformConfig {
    fn default() -> Self {
        Self {
            oauth: OAuthSettings::default(),
            credentials_path: None,
            token_path: default_token_path(),
            forms_base_url: default_forms_base_url(),
            timeout_secs: default_timeout(),
            max_batch_size: 0,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            port: default_port(),
        }
    }
}

impl MagicformConfig {
    /// Batching and retry settings for the form builder.
    pub fn builder_config(&self) -> FormBuilderConfig {
        FormBuilderConfig {
            max_batch_size: self.max_batch_size,
            max_retries: self.max_retries,
            retry_delay: std::time::Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Resolve the OAuth client.
    ///
    /// Uses `[oauth]` when it carries both id and secret, otherwise the
    /// Google secrets file at `credentials_path` (or `client_secret.json`
    /// in the current directory).
    pub fn client_settings(&self) -> Result<OAuthSettings, AuthError> {
        if self.oauth.has_client() {
            return Ok(self.oauth.clone());
        }

        let path = self
            .credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("client_secret.json"));
        if !path.exists() {
            return Err(AuthError::MissingClientSecrets(format!(
                "set [oauth] client_id/client_secret, MAGICFORM_CLIENT_ID/MAGICFORM_CLIENT_SECRET, \
                 or provide {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let mut settings = parse_client_secrets_json(&content)?;
        settings.scopes = self.oauth.scopes.clone();
        if self.oauth.redirect_uri.is_some() {
            settings.redirect_uri = self.oauth.redirect_uri.clone();
        }
        Ok(settings)
    }
}

/// Google's downloadable client secrets file.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    #[serde(default)]
    installed: Option<ClientSecretsEntry>,
    #[serde(default)]
    web: Option<ClientSecretsEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsEntry {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// Parse a `client_secret.json` (`installed` or `web` section).
pub fn parse_client_secrets_json(content: &str) -> Result<OAuthSettings, AuthError> {
    let file: ClientSecretsFile = serde_json::from_str(content)?;
    let entry = file.installed.or(file.web).ok_or_else(|| {
        AuthError::MissingClientSecrets(
            "client secrets file has neither an 'installed' nor a 'web' section".into(),
        )
    })?;

    Ok(OAuthSettings {
        client_id: entry.client_id,
        client_secret: entry.client_secret,
        auth_uri: entry.auth_uri,
        token_uri: entry.token_uri,
        redirect_uri: entry.redirect_uris.into_iter().next(),
        scopes: default_scopes(),
    })
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `magicform.toml` in the current directory
/// 2. `~/.config/magicform/config.toml`
///
/// Environment variable overrides: `MAGICFORM_CLIENT_ID`,
/// `MAGICFORM_CLIENT_SECRET`, `MAGICFORM_REDIRECT_URL`,
/// `MAGICFORM_TOKEN_PATH`, `MAGICFORM_FORMS_BASE_URL`.
pub fn load_config() -> Result<MagicformConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MagicformConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("magicform.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<MagicformConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MagicformConfig::default(),
    };

    apply_env_overrides(&mut config);
    config.oauth.client_id = resolve_env_vars(&config.oauth.client_id);
    config.oauth.client_secret = resolve_env_vars(&config.oauth.client_secret);
    config.oauth.redirect_uri = config.oauth.redirect_uri.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn apply_env_overrides(config: &mut MagicformConfig) {
    if let Ok(id) = std::env::var("MAGICFORM_CLIENT_ID") {
        config.oauth.client_id = id;
    }
    if let Ok(secret) = std::env::var("MAGICFORM_CLIENT_SECRET") {
        config.oauth.client_secret = secret;
    }
    if let Ok(url) = std::env::var("MAGICFORM_REDIRECT_URL") {
        config.oauth.redirect_uri = Some(url);
    }
    if let Ok(path) = std::env::var("MAGICFORM_TOKEN_PATH") {
        config.token_path = PathBuf::from(path);
    }
    if let Ok(url) = std::env::var("MAGICFORM_FORMS_BASE_URL") {
        config.forms_base_url = url;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("magicform"))
}
