//! Core data model types for magicform.
//!
//! A question list is read once from a JSON document of the form
//! `{ "questions": [ ... ] }` and translated into one outbound batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single question record as written in the input document.
///
/// Every field is optional so a record without a title can be reported and
/// skipped instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question text shown to the respondent.
    #[serde(default)]
    pub title: Option<String>,
    /// Raw type tag (`RADIO`, `CHECKBOX`, `DROPDOWN`, `TEXT`), any case.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Ordered option strings for choice questions.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Whether an answer is required. Defaults to `true`.
    #[serde(default)]
    pub required: Option<bool>,
    /// The correct option value, used for grading RADIO questions.
    #[serde(default)]
    pub correct: Option<String>,
}

impl Question {
    /// The title, if present and not blank.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// The parsed question type. Missing, blank and unknown tags all map to
    /// [`QuestionType::Untyped`].
    pub fn question_type(&self) -> QuestionType {
        self.kind
            .as_deref()
            .and_then(|k| k.parse().ok())
            .unwrap_or(QuestionType::Untyped)
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    /// The correct value, if present and not empty.
    pub fn correct(&self) -> Option<&str> {
        self.correct.as_deref().filter(|c| !c.is_empty())
    }

    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }
}

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    Radio,
    Checkbox,
    Dropdown,
    Text,
    /// Missing or unsupported type tag; the item gets no typed body.
    Untyped,
}

impl QuestionType {
    /// Whether this type renders a list of options.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionType::Radio | QuestionType::Checkbox | QuestionType::Dropdown
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Radio => write!(f, "RADIO"),
            QuestionType::Checkbox => write!(f, "CHECKBOX"),
            QuestionType::Dropdown => write!(f, "DROPDOWN"),
            QuestionType::Text => write!(f, "TEXT"),
            QuestionType::Untyped => write!(f, "-"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RADIO" => Ok(QuestionType::Radio),
            "CHECKBOX" => Ok(QuestionType::Checkbox),
            "DROPDOWN" => Ok(QuestionType::Dropdown),
            "TEXT" => Ok(QuestionType::Text),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// The whole input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parse_is_case_insensitive() {
        assert_eq!("radio".parse::<QuestionType>().unwrap(), QuestionType::Radio);
        assert_eq!(
            "CheckBox".parse::<QuestionType>().unwrap(),
            QuestionType::Checkbox
        );
        assert_eq!(
            "DROPDOWN".parse::<QuestionType>().unwrap(),
            QuestionType::Dropdown
        );
        assert_eq!("text".parse::<QuestionType>().unwrap(), QuestionType::Text);
        assert!("SCALE".parse::<QuestionType>().is_err());
    }

    #[test]
    fn question_defaults() {
        let q: Question = serde_json::from_str(r#"{"title": "Q"}"#).unwrap();
        assert!(q.is_required());
        assert_eq!(q.question_type(), QuestionType::Untyped);
        assert!(q.options().is_empty());
        assert!(q.correct().is_none());
    }

    #[test]
    fn blank_title_is_missing() {
        let q = Question {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(q.title().is_none());
    }

    #[test]
    fn empty_correct_is_missing() {
        let q = Question {
            correct: Some(String::new()),
            ..Default::default()
        };
        assert!(q.correct().is_none());
    }
}
