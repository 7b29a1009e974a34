//! magicform-google: Google OAuth2 and Forms API integration.
//!
//! Implements token acquisition and refresh against Google's OAuth2
//! endpoints, token persistence, the loopback redirect used by the
//! installed-app flow, and the `FormsService` trait over the Forms REST API.

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod loopback;
pub mod mock;
pub mod oauth;
pub mod token;

pub use auth::Authenticator;
pub use config::{load_config, load_config_from, MagicformConfig, OAuthSettings};
pub use error::AuthError;
pub use forms::GoogleFormsClient;
pub use mock::{RecordedCall, RecordingFormsService};
pub use token::{TokenRecord, TokenStore};
