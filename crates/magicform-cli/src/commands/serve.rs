//! The `magicform serve` command.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;

use magicform_google::config::load_config_from;

pub async fn execute(addr: SocketAddr, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(?config, "loaded config");
    magicform_web::serve(config, addr).await
}
