//! The `magicform init` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use magicform_core::parser::SAMPLE_QUESTIONS_JSON;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("magicform.toml"));
    write_if_missing(&config_path, SAMPLE_CONFIG)?;
    write_if_missing(Path::new("questions.json"), SAMPLE_QUESTIONS_JSON)?;

    println!("\nNext steps:");
    println!(
        "  1. Put your OAuth client id and secret in {} (or download client_secret.json)",
        config_path.display()
    );
    println!("  2. Run: magicform validate --questions questions.json");
    println!("  3. Run: magicform create --questions questions.json --title \"My quiz\"");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# magicform configuration

[oauth]
client_id = "${MAGICFORM_CLIENT_ID}"
client_secret = "${MAGICFORM_CLIENT_SECRET}"
# redirect_uri = "http://localhost:8501/oauth2callback"
scopes = ["https://www.googleapis.com/auth/drive"]

# Used when [oauth] has no client id/secret.
# credentials_path = "client_secret.json"

token_path = "token.json"
timeout_secs = 60
# 0 sends every question in one batchUpdate call.
max_batch_size = 0
max_retries = 3
retry_delay_ms = 1000
# Loopback port for the installed-app flow.
port = 8000
"#;
