//! Question → Forms API request translation.
//!
//! Each input record maps to zero or one `createItem` request. The item is
//! placed at the record's position in the input list, so the form mirrors
//! the document order.

use serde::Serialize;

use crate::forms::{
    BatchUpdateRequest, ChoiceOption, ChoiceQuestion, ChoiceType, CorrectAnswer, CorrectAnswers,
    CreateItemRequest, FormSettings, Grading, Item, Location, Question as FormQuestion,
    QuestionItem, QuizSettings, Request, TextQuestion, UpdateSettingsRequest,
};
use crate::model::{Question, QuestionSet, QuestionType};

/// Points awarded for a correctly answered graded question.
pub const POINTS_PER_QUESTION: u32 = 1;

/// Field mask for toggling quiz mode.
pub const QUIZ_UPDATE_MASK: &str = "quizSettings.isQuiz";

/// The outcome of translating a whole question set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Translation {
    /// `createItem` requests in input order.
    pub requests: Vec<Request>,
    /// Indices of records that were skipped for lack of a title.
    pub skipped: Vec<usize>,
}

impl Translation {
    /// Split the requests into batch-update bodies of at most `max` requests.
    ///
    /// A `max` of zero means no limit. An empty translation yields no batches.
    pub fn into_batches(self, max: usize) -> Vec<BatchUpdateRequest> {
        if self.requests.is_empty() {
            return Vec::new();
        }
        let max = if max == 0 { self.requests.len() } else { max };

        self.requests
            .chunks(max)
            .map(|chunk| BatchUpdateRequest {
                requests: chunk.to_vec(),
                include_form_in_response: false,
            })
            .collect()
    }
}

/// Translate one question record into a `createItem` request.
///
/// Returns `None` (and logs a warning) when the record has no title.
pub fn translate_question(index: usize, question: &Question) -> Option<CreateItemRequest> {
    let Some(title) = question.title() else {
        tracing::warn!("skipping question at index {index} due to missing 'title'");
        return None;
    };

    let mut body = FormQuestion {
        required: question.is_required(),
        ..Default::default()
    };

    match question.question_type() {
        QuestionType::Radio => {
            let mut options = choice_options(question.options());
            if let Some(correct) = question.correct() {
                for option in &mut options {
                    option.is_correct = Some(option.value == correct);
                }
                body.grading = Some(Grading {
                    point_value: POINTS_PER_QUESTION,
                    correct_answers: CorrectAnswers {
                        answers: vec![CorrectAnswer {
                            value: correct.to_string(),
                        }],
                    },
                });
            }
            body.choice_question = Some(ChoiceQuestion {
                kind: ChoiceType::Radio,
                options,
            });
        }
        QuestionType::Checkbox => {
            body.choice_question = Some(ChoiceQuestion {
                kind: ChoiceType::Checkbox,
                options: choice_options(question.options()),
            });
        }
        QuestionType::Dropdown => {
            body.choice_question = Some(ChoiceQuestion {
                kind: ChoiceType::DropDown,
                options: choice_options(question.options()),
            });
        }
        QuestionType::Text => body.text_question = Some(TextQuestion::default()),
        QuestionType::Untyped => {}
    }

    Some(CreateItemRequest {
        item: Item {
            title: title.to_string(),
            description: None,
            question_item: QuestionItem { question: body },
        },
        location: Location { index },
    })
}

fn choice_options(values: &[String]) -> Vec<ChoiceOption> {
    values
        .iter()
        .map(|value| ChoiceOption {
            value: value.clone(),
            is_correct: None,
        })
        .collect()
}

/// Translate a whole question set, preserving input order.
pub fn translate_questions(set: &QuestionSet) -> Translation {
    let mut translation = Translation::default();

    for (index, question) in set.questions.iter().enumerate() {
        match translate_question(index, question) {
            Some(request) => translation.requests.push(Request::CreateItem(request)),
            None => translation.skipped.push(index),
        }
    }

    tracing::debug!(
        items = translation.requests.len(),
        skipped = translation.skipped.len(),
        "translated question set"
    );
    translation
}

/// The settings update that turns a form into an auto-graded quiz.
pub fn quiz_settings_request() -> BatchUpdateRequest {
    BatchUpdateRequest {
        requests: vec![Request::UpdateSettings(UpdateSettingsRequest {
            settings: FormSettings {
                quiz_settings: QuizSettings { is_quiz: true },
            },
            update_mask: QUIZ_UPDATE_MASK.to_string(),
        })],
        include_form_in_response: false,
    }
}
