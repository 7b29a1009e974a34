//! Form builder: turns a question set into a quiz form.
//!
//! The builder creates the form, switches it to quiz mode, then sends the
//! translated questions in one or more batch updates. Rate-limited calls are
//! retried with backoff. Server errors are only retried for the quiz settings
//! update, since repeating a form or item creation that may already have
//! been committed would duplicate it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::error::FormsError;
use crate::forms::{BatchUpdateRequest, CreatedForm};
use crate::model::QuestionSet;
use crate::traits::FormsService;
use crate::translate::{quiz_settings_request, translate_questions};

/// Whether a remote call may be repeated after an ambiguous failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Repeating the call has the same effect as making it once.
    Idempotent,
    /// The call creates something; only retry when it surely did not run.
    Creating,
}

/// Configuration for the form builder.
#[derive(Debug, Clone)]
pub struct FormBuilderConfig {
    /// Maximum `createItem` requests per batch update (0 = unlimited).
    pub max_batch_size: usize,
    /// Retries per remote call on transient errors.
    pub max_retries: u32,
    /// Initial delay between retries.
    pub retry_delay: Duration,
}

impl Default for FormBuilderConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 0,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Callback trait for reporting progress while a form is built.
pub trait ProgressReporter: Send + Sync {
    fn on_form_created(&self, form: &CreatedForm);
    fn on_question_skipped(&self, index: usize);
    fn on_batch_sent(&self, batch: usize, total: usize, items: usize);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_form_created(&self, _: &CreatedForm) {}
    fn on_question_skipped(&self, _: usize) {}
    fn on_batch_sent(&self, _: usize, _: usize, _: usize) {}
}

/// Result of adding questions to a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddQuestionsOutcome {
    /// Number of items created.
    pub created: usize,
    /// Indices of questions skipped for lack of a title.
    pub skipped: Vec<usize>,
    /// Number of batch-update calls issued.
    pub batches: usize,
}

/// Result of a full build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutcome {
    pub form: CreatedForm,
    pub questions: AddQuestionsOutcome,
}

pub struct FormBuilder {
    service: Arc<dyn FormsService>,
    config: FormBuilderConfig,
}

impl FormBuilder {
    pub fn new(service: Arc<dyn FormsService>, config: FormBuilderConfig) -> Self {
        Self { service, config }
    }

    /// Create a form with the given title and mark it as a quiz.
    pub async fn create_quiz_form(&self, title: &str) -> Result<CreatedForm> {
        let title = title.trim();
        anyhow::ensure!(!title.is_empty(), "form title must not be empty");

        let form = self
            .with_retries("create form", Replay::Creating, || {
                self.service.create_form(title)
            })
            .await?;
        tracing::info!(form_id = %form.form_id, "created form");

        let settings = quiz_settings_request();
        self.with_retries("enable quiz mode", Replay::Idempotent, || {
            self.service.batch_update(&form.form_id, &settings)
        })
        .await?;
        tracing::info!(form_id = %form.form_id, "enabled quiz mode");

        Ok(form)
    }

    /// Translate the question set and add the items to an existing form.
    pub async fn add_questions(
        &self,
        form_id: &str,
        set: &QuestionSet,
        progress: &dyn ProgressReporter,
    ) -> Result<AddQuestionsOutcome> {
        let translation = translate_questions(set);
        for &index in &translation.skipped {
            progress.on_question_skipped(index);
        }

        let skipped = translation.skipped.clone();
        let batches: Vec<BatchUpdateRequest> =
            translation.into_batches(self.config.max_batch_size);
        let total = batches.len();
        let mut created = 0;

        for (i, batch) in batches.iter().enumerate() {
            tracing::debug!(
                body = %serde_json::to_string(batch).unwrap_or_default(),
                "sending batch update"
            );
            self.with_retries("add questions", Replay::Creating, || {
                self.service.batch_update(form_id, batch)
            })
            .await?;
            created += batch.requests.len();
            progress.on_batch_sent(i + 1, total, batch.requests.len());
        }

        tracing::info!(form_id, created, skipped = skipped.len(), "added questions");
        Ok(AddQuestionsOutcome {
            created,
            skipped,
            batches: total,
        })
    }

    /// Create a quiz form and populate it with the question set.
    pub async fn build(
        &self,
        title: &str,
        set: &QuestionSet,
        progress: &dyn ProgressReporter,
    ) -> Result<BuildOutcome> {
        let form = self.create_quiz_form(title).await?;
        progress.on_form_created(&form);

        let questions = self.add_questions(&form.form_id, set, progress).await?;
        Ok(BuildOutcome { form, questions })
    }

    /// Run a remote call, retrying transient errors with exponential backoff.
    async fn with_retries<T, F, Fut>(&self, what: &str, replay: Replay, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry_delay = self.config.retry_delay;
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let Some(forms_err) = e.downcast_ref::<FormsError>() else {
                        return Err(e);
                    };
                    if !should_retry(forms_err, replay) || attempt >= self.config.max_retries {
                        return Err(e.context(format!("failed to {what}")));
                    }

                    let delay = forms_err
                        .retry_after_ms()
                        .map(Duration::from_millis)
                        .unwrap_or(retry_delay);
                    attempt += 1;
                    tracing::warn!(
                        "{what} failed ({forms_err}), retry {attempt}/{} in {}ms",
                        self.config.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
                }
            }
        }
    }
}

/// A 429 means the request was refused, so any call may be repeated. A 5xx
/// may arrive after the server committed the change.
fn should_retry(err: &FormsError, replay: Replay) -> bool {
    if err.is_permanent() {
        return false;
    }
    if err.retry_after_ms().is_some() {
        return true;
    }
    replay == Replay::Idempotent
        && matches!(err, FormsError::ApiError { status, .. } if *status >= 500)
}
