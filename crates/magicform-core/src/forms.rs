//! Google Forms API v1 wire types.
//!
//! Only the subset of the resource model that magicform reads or writes is
//! represented here. Field names follow the API's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Body of `forms.create`. Only the title may be set at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewForm {
    pub info: Info,
}

impl NewForm {
    pub fn titled(title: &str) -> Self {
        Self {
            info: Info {
                title: title.to_string(),
                document_title: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
}

/// The parts of a created form the caller needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedForm {
    pub form_id: String,
    pub responder_uri: String,
    #[serde(default)]
    pub revision_id: Option<String>,
}

/// Body of `forms.batchUpdate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_form_in_response: bool,
}

/// A single mutation inside a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    CreateItem(CreateItemRequest),
    UpdateSettings(UpdateSettingsRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub item: Item,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub question_item: QuestionItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: Question,
}

/// A question body. At most one of the typed fields is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_question: Option<ChoiceQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_question: Option<TextQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading: Option<Grading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    #[serde(rename = "type")]
    pub kind: ChoiceType,
    pub options: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChoiceType {
    Radio,
    Checkbox,
    DropDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Free-text question. Serializes to `{}` for a short answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextQuestion {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub paragraph: bool,
}

/// Quiz grading for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grading {
    pub point_value: u32,
    pub correct_answers: CorrectAnswers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectAnswers {
    pub answers: Vec<CorrectAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectAnswer {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub settings: FormSettings,
    pub update_mask: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    pub quiz_settings: QuizSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    pub is_quiz: bool,
}

/// Response of `forms.batchUpdate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}
