//! Google Forms REST API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use magicform_core::error::FormsError;
use magicform_core::forms::{BatchUpdateRequest, BatchUpdateResponse, CreatedForm, NewForm};
use magicform_core::traits::FormsService;

use crate::config::DEFAULT_FORMS_BASE_URL;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
/// Longest `Retry-After` honoured; larger hints are clamped.
const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Forms API v1 client authenticated with a bearer token.
pub struct GoogleFormsClient {
    access_token: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

/// Google's error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GoogleFormsClient {
    pub fn new(
        access_token: &str,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, FormsError> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FormsError::NetworkError(e.to_string()))?;

        Ok(Self {
            access_token: access_token.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_FORMS_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs,
            client,
        })
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, FormsError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FormsError::Timeout(self.timeout_secs)
                } else {
                    FormsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .min(MAX_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(FormsError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            return Err(match status {
                401 => FormsError::AuthenticationFailed(message),
                403 => FormsError::PermissionDenied(message),
                404 => FormsError::FormNotFound(message),
                _ => FormsError::ApiError { status, message },
            });
        }

        response.json().await.map_err(|e| FormsError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

/// Prefer Google's structured message over the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) if !parsed.error.status.is_empty() => {
            format!("{} ({})", parsed.error.message, parsed.error.status)
        }
        Ok(parsed) => parsed.error.message,
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl FormsService for GoogleFormsClient {
    #[instrument(skip(self))]
    async fn create_form(&self, title: &str) -> anyhow::Result<CreatedForm> {
        let url = format!("{}/v1/forms", self.base_url);
        Ok(self.post(url, &NewForm::titled(title)).await?)
    }

    #[instrument(skip(self, body), fields(requests = body.requests.len()))]
    async fn batch_update(
        &self,
        form_id: &str,
        body: &BatchUpdateRequest,
    ) -> anyhow::Result<BatchUpdateResponse> {
        let url = format!("{}/v1/forms/{}:batchUpdate", self.base_url, form_id);
        Ok(self.post(url, body).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magicform_core::translate::quiz_settings_request;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleFormsClient {
        GoogleFormsClient::new("test-token", Some(server.uri()), Some(5)).unwrap()
    }

    #[tokio::test]
    async fn create_form_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/forms"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({"info": {"title": "DevOps quiz"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "formId": "1FAIpQL",
                "info": {"title": "DevOps quiz", "documentTitle": "Untitled form"},
                "responderUri": "https://docs.google.com/forms/d/e/1FAIpQL/viewform",
                "revisionId": "00000002"
            })))
            .mount(&server)
            .await;

        let form = client(&server).create_form("DevOps quiz").await.unwrap();
        assert_eq!(form.form_id, "1FAIpQL");
        assert!(form.responder_uri.ends_with("/viewform"));
    }

    #[tokio::test]
    async fn batch_update_posts_to_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/forms/abc:batchUpdate"))
            .and(body_json(serde_json::to_value(quiz_settings_request()).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "replies": [{}],
                "writeControl": {"requiredRevisionId": "00000003"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .batch_update("abc", &quiz_settings_request())
            .await
            .unwrap();
        assert_eq!(response.replies.len(), 1);
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "code": 401,
                    "message": "Request had invalid authentication credentials.",
                    "status": "UNAUTHENTICATED"
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_form("x").await.unwrap_err();
        let forms_err = err.downcast_ref::<FormsError>().unwrap();
        assert!(forms_err.is_permanent());
        assert!(err.to_string().contains("UNAUTHENTICATED"));
    }

    #[tokio::test]
    async fn status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/forms/missing:batchUpdate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/forms/locked:batchUpdate"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/forms/bad:batchUpdate"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "Invalid requests[0].createItem"}
            })))
            .mount(&server)
            .await;

        let c = client(&server);
        let body = quiz_settings_request();

        let err = c.batch_update("missing", &body).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormsError>(),
            Some(FormsError::FormNotFound(_))
        ));

        let err = c.batch_update("locked", &body).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormsError>(),
            Some(FormsError::PermissionDenied(_))
        ));

        let err = c.batch_update("bad", &body).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormsError>(),
            Some(FormsError::ApiError { status: 400, message })
                if message == "Invalid requests[0].createItem"
        ));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = client(&server).create_form("x").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<FormsError>()
                .and_then(FormsError::retry_after_ms),
            Some(7000)
        );
    }

    #[tokio::test]
    async fn huge_retry_after_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
            )
            .mount(&server)
            .await;

        let err = client(&server).create_form("x").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<FormsError>()
                .and_then(FormsError::retry_after_ms),
            Some(MAX_RETRY_AFTER_SECS * 1000)
        );
    }
}
