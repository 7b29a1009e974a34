//! The `magicform validate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use magicform_core::parser;

pub fn execute(questions_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = &config_path {
        magicform_google::config::load_config_from(Some(path.as_path()))?;
    }

    let set = parser::parse_question_set(&questions_path)?;
    println!(
        "Questions: {} ({} entries)",
        questions_path.display(),
        set.questions.len()
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "Title", "Type", "Options", "Required", "Correct"]);
    for (index, question) in set.questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(question.title().unwrap_or("(missing)")),
            Cell::new(question.question_type()),
            Cell::new(question.options().len()),
            Cell::new(if question.is_required() { "yes" } else { "no" }),
            Cell::new(question.correct().unwrap_or("")),
        ]);
    }
    println!("{table}");

    let warnings = parser::validate_question_set(&set);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.index, w.message);
    }

    if warnings.is_empty() {
        println!("All questions valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
