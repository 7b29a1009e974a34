//! The `magicform create` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use magicform_core::builder::{FormBuilder, ProgressReporter};
use magicform_core::forms::CreatedForm;
use magicform_core::parser;
use magicform_google::config::load_config_from;
use magicform_google::{Authenticator, GoogleFormsClient};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_form_created(&self, form: &CreatedForm) {
        eprintln!("  Created form {}", form.form_id);
    }

    fn on_question_skipped(&self, index: usize) {
        eprintln!("  Skipping question at index {index} due to missing 'title'");
    }

    fn on_batch_sent(&self, batch: usize, total: usize, items: usize) {
        eprintln!("  Sent batch {batch}/{total} ({items} items)");
    }
}

pub async fn execute(
    questions_path: PathBuf,
    title: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(?config, "loaded config");
    let set = parser::parse_question_set(&questions_path)?;

    let title = match title {
        Some(t) => t,
        None => prompt_title()?,
    };
    anyhow::ensure!(!title.trim().is_empty(), "form title must not be empty");

    let auth = Authenticator::from_config(&config)?;
    let token = auth
        .token_or_authorize(port.unwrap_or(config.port), super::show_consent_url)
        .await
        .context("authorization failed")?;

    let service = GoogleFormsClient::new(
        &token.token,
        Some(config.forms_base_url.clone()),
        Some(config.timeout_secs),
    )?;
    let builder = FormBuilder::new(Arc::new(service), config.builder_config());

    let outcome = builder.build(&title, &set, &ConsoleReporter).await?;

    println!("Form created with ID: {}", outcome.form.form_id);
    println!("Form URL: {}", outcome.form.responder_uri);
    println!("Questions added to the form.");
    if !outcome.questions.skipped.is_empty() {
        println!(
            "{} question(s) skipped for lack of a title.",
            outcome.questions.skipped.len()
        );
    }

    Ok(())
}

fn prompt_title() -> Result<String> {
    print!("Enter the form title: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read form title")?;
    Ok(line.trim().to_string())
}
