//! In-memory Forms service that records calls instead of sending them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;

use magicform_core::forms::{BatchUpdateRequest, BatchUpdateResponse, CreatedForm};
use magicform_core::traits::FormsService;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecordedCall {
    CreateForm { title: String },
    BatchUpdate { form_id: String, body: BatchUpdateRequest },
}

/// A Forms service for dry runs and tests.
///
/// Every form it creates gets the id `mock-form-<n>`.
#[derive(Default)]
pub struct RecordingFormsService {
    calls: Mutex<Vec<RecordedCall>>,
    forms_created: AtomicU32,
}

impl RecordingFormsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FormsService for RecordingFormsService {
    async fn create_form(&self, title: &str) -> anyhow::Result<CreatedForm> {
        let n = self.forms_created.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().push(RecordedCall::CreateForm {
            title: title.to_string(),
        });

        let form_id = format!("mock-form-{n}");
        Ok(CreatedForm {
            responder_uri: format!("https://docs.google.com/forms/d/e/{form_id}/viewform"),
            form_id,
            revision_id: None,
        })
    }

    async fn batch_update(
        &self,
        form_id: &str,
        body: &BatchUpdateRequest,
    ) -> anyhow::Result<BatchUpdateResponse> {
        self.lock().push(RecordedCall::BatchUpdate {
            form_id: form_id.to_string(),
            body: body.clone(),
        });
        Ok(BatchUpdateResponse {
            replies: vec![serde_json::json!({}); body.requests.len()],
        })
    }
}
