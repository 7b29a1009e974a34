//! Core trait definitions for the remote forms service.
//!
//! Implemented by `magicform-google` for the real API and by its mock for
//! tests.

use async_trait::async_trait;

use crate::forms::{BatchUpdateRequest, BatchUpdateResponse, CreatedForm};

/// A service that can create forms and apply batched mutations to them.
#[async_trait]
pub trait FormsService: Send + Sync {
    /// Create an empty form with the given title.
    async fn create_form(&self, title: &str) -> anyhow::Result<CreatedForm>;

    /// Apply a batch of requests to an existing form.
    async fn batch_update(
        &self,
        form_id: &str,
        body: &BatchUpdateRequest,
    ) -> anyhow::Result<BatchUpdateResponse>;
}
