//! The `magicform preview` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use magicform_core::builder::{FormBuilder, NoopReporter};
use magicform_core::parser;
use magicform_google::config::load_config_from;
use magicform_google::RecordingFormsService;

/// Run the whole build against a recording service and print every call
/// `create` would make, without touching the network.
pub async fn execute(
    questions_path: PathBuf,
    title: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let set = parser::parse_question_set(&questions_path)?;

    let service = Arc::new(RecordingFormsService::new());
    let builder = FormBuilder::new(service.clone(), config.builder_config());
    let outcome = builder.build(&title, &set, &NoopReporter).await?;

    for index in &outcome.questions.skipped {
        eprintln!("Skipping question at index {index} due to missing 'title'");
    }
    println!("{}", serde_json::to_string_pretty(&service.calls())?);

    Ok(())
}
