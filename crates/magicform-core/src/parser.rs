//! JSON question list parser.
//!
//! Loads question sets from JSON files, strings or readers, and validates
//! them.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{QuestionSet, QuestionType};

/// A starter question document showing the expected format.
pub const SAMPLE_QUESTIONS_JSON: &str = r#"{
  "questions": [
    {
      "title": "What is DevOps?",
      "type": "RADIO",
      "options": [
        "A programming language",
        "A set of practices that combines software development and IT operations",
        "A type of database"
      ],
      "correct": "A set of practices that combines software development and IT operations",
      "required": true
    },
    {
      "title": "Which tool is commonly used for version control in DevOps?",
      "type": "RADIO",
      "options": ["Git", "Excel", "Java"],
      "correct": "Git",
      "required": true
    },
    {
      "title": "Which of these are CI/CD tools?",
      "type": "CHECKBOX",
      "options": ["Jenkins", "GitHub Actions", "Photoshop"],
      "required": false
    },
    {
      "title": "Preferred cloud provider",
      "type": "DROPDOWN",
      "options": ["AWS", "Azure", "Google Cloud"]
    },
    {
      "title": "Describe your deployment pipeline",
      "type": "TEXT",
      "required": false
    }
  ]
}
"#;

/// Parse a JSON file into a `QuestionSet`.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read questions file: {}", path.display()))?;

    parse_question_set_str(&content, path)
}

/// Parse a JSON string into a `QuestionSet` (useful for testing).
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
}

/// Parse a question set from any reader, e.g. an uploaded file body.
pub fn parse_question_set_reader<R: Read>(reader: R) -> Result<QuestionSet> {
    serde_json::from_reader(reader).context("failed to parse questions JSON")
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Index of the question in the input list.
    pub index: usize,
    /// Warning message.
    pub message: String,
}

/// Validate a question set for common issues.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut seen_titles = HashSet::new();

    for (index, question) in set.questions.iter().enumerate() {
        let mut warn = |message: String| warnings.push(ValidationWarning { index, message });

        match question.title() {
            None => warn("missing 'title', question will be skipped".into()),
            Some(title) => {
                if !seen_titles.insert(title) {
                    warn(format!("duplicate title: {title}"));
                }
            }
        }

        let question_type = question.question_type();
        if question_type == QuestionType::Untyped {
            match question.kind.as_deref().map(str::trim) {
                None | Some("") => {
                    warn("missing 'type', item will have no question body".into())
                }
                Some(other) => warn(format!(
                    "unsupported type '{other}', item will have no question body"
                )),
            }
        }

        if question_type.is_choice() && question.options().is_empty() {
            warn(format!("{question_type} question has no options"));
        }

        if let Some(correct) = question.correct() {
            if question_type != QuestionType::Radio {
                warn("'correct' is only graded for RADIO questions and will be ignored".into());
            } else if !question.options().iter().any(|o| o == correct) {
                warn(format!("correct answer '{correct}' is not one of the options"));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_JSON: &str = r#"{
  "questions": [
    {
      "title": "What is DevOps?",
      "type": "RADIO",
      "options": [
        "A programming language",
        "A set of practices that combines software development and IT operations",
        "A type of database"
      ],
      "correct": "A set of practices that combines software development and IT operations",
      "required": true
    },
    {
      "title": "Which tools are used for CI?",
      "type": "checkbox",
      "options": ["Jenkins", "GitHub Actions", "Excel"],
      "required": false
    },
    {
      "title": "Describe your pipeline",
      "type": "TEXT"
    }
  ]
}"#;

    #[test]
    fn parse_valid_json() {
        let set = parse_question_set_str(VALID_JSON, &PathBuf::from("q.json")).unwrap();
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[0].question_type(), QuestionType::Radio);
        assert_eq!(set.questions[1].question_type(), QuestionType::Checkbox);
        assert!(!set.questions[1].is_required());
        assert!(set.questions[2].is_required());
        assert!(validate_question_set(&set).is_empty());
    }

    #[test]
    fn sample_is_valid() {
        let set =
            parse_question_set_str(SAMPLE_QUESTIONS_JSON, &PathBuf::from("sample.json")).unwrap();
        assert_eq!(set.questions.len(), 5);
        assert!(validate_question_set(&set).is_empty());
    }

    #[test]
    fn parse_missing_questions_key() {
        let result = parse_question_set_str(r#"{"items": []}"#, &PathBuf::from("q.json"));
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("q.json"));
    }

    #[test]
    fn parse_malformed_json() {
        let result = parse_question_set_str("{ not json", &PathBuf::from("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn parse_from_reader() {
        let set = parse_question_set_reader(VALID_JSON.as_bytes()).unwrap();
        assert_eq!(set.questions.len(), 3);
    }

    #[test]
    fn parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, VALID_JSON).unwrap();

        let set = parse_question_set(&path).unwrap();
        assert_eq!(set.questions[0].title(), Some("What is DevOps?"));
    }

    #[test]
    fn validate_missing_title() {
        let json = r#"{"questions": [{"type": "TEXT"}, {"title": "", "type": "TEXT"}]}"#;
        let set = parse_question_set_str(json, &PathBuf::from("q.json")).unwrap();
        let warnings = validate_question_set(&set);
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.message.contains("missing 'title'"))
                .map(|w| w.index)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn validate_type_issues() {
        let json = r#"{"questions": [
            {"title": "A"},
            {"title": "B", "type": "SCALE"},
            {"title": "C", "type": "DROPDOWN"}
        ]}"#;
        let set = parse_question_set_str(json, &PathBuf::from("q.json")).unwrap();
        let warnings = validate_question_set(&set);
        assert!(warnings
            .iter()
            .any(|w| w.index == 0 && w.message.contains("missing 'type'")));
        assert!(warnings
            .iter()
            .any(|w| w.index == 1 && w.message.contains("unsupported type 'SCALE'")));
        assert!(warnings
            .iter()
            .any(|w| w.index == 2 && w.message.contains("no options")));
    }

    #[test]
    fn validate_correct_answer() {
        let json = r#"{"questions": [
            {"title": "A", "type": "RADIO", "options": ["x", "y"], "correct": "z"},
            {"title": "B", "type": "CHECKBOX", "options": ["x"], "correct": "x"}
        ]}"#;
        let set = parse_question_set_str(json, &PathBuf::from("q.json")).unwrap();
        let warnings = validate_question_set(&set);
        assert!(warnings
            .iter()
            .any(|w| w.index == 0 && w.message.contains("not one of the options")));
        assert!(warnings
            .iter()
            .any(|w| w.index == 1 && w.message.contains("only graded for RADIO")));
    }

    #[test]
    fn validate_duplicate_titles() {
        let json = r#"{"questions": [
            {"title": "Same", "type": "TEXT"},
            {"title": "Same", "type": "TEXT"}
        ]}"#;
        let set = parse_question_set_str(json, &PathBuf::from("q.json")).unwrap();
        let warnings = validate_question_set(&set);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].index, 1);
        assert!(warnings[0].message.contains("duplicate"));
    }
}
