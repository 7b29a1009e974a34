//! The `magicform auth` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use magicform_google::config::load_config_from;
use magicform_google::Authenticator;

pub async fn execute(port: Option<u16>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let auth = Authenticator::from_config(&config)?;
    let port = port.unwrap_or(config.port);

    let record = auth
        .token_or_authorize(port, super::show_consent_url)
        .await
        .context("authorization failed")?;

    println!("Authorized. Token saved to {}", auth.store().path().display());
    if let Some(expiry) = record.expiry {
        println!("Access token expires at {}", expiry.to_rfc3339());
    }
    Ok(())
}
