//! axum server for the hosted variant.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use thiserror::Error;

use magicform_core::builder::{FormBuilder, NoopReporter};
use magicform_core::parser::{parse_question_set_reader, SAMPLE_QUESTIONS_JSON};
use magicform_google::{Authenticator, GoogleFormsClient, MagicformConfig};

use crate::html;

/// How long a consent link stays usable.
const STATE_TTL: Duration = Duration::from_secs(10 * 60);
/// Upper bound on outstanding consent links; the oldest is evicted first.
const MAX_PENDING_STATES: usize = 256;

/// Errors surfaced to the browser.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    BadRequest(String),

    #[error("not authorized, please authorize the app first")]
    Unauthorized,

    #[error("{0:#}")]
    Upstream(anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::warn!(%status, "{self}");
        (status, Html(html::render_error(&self.to_string()))).into_response()
    }
}

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: MagicformConfig,
    auth: Authenticator,
    redirect_uri: String,
    /// OAuth `state` values handed out by `GET /`, with their issue time.
    pending_states: Mutex<HashMap<String, Instant>>,
}

impl AppState {
    pub fn new(config: MagicformConfig, auth: Authenticator, redirect_uri: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                auth,
                redirect_uri,
                pending_states: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn pending_states(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.inner
            .pending_states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn remember_state(&self, state: String) {
        let now = Instant::now();
        let mut states = self.pending_states();
        states.retain(|_, issued| now.duration_since(*issued) < STATE_TTL);

        while states.len() >= MAX_PENDING_STATES {
            let Some(oldest) = states
                .iter()
                .min_by_key(|(_, issued)| **issued)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            states.remove(&oldest);
        }
        states.insert(state, now);
    }

    fn take_state(&self, state: &str) -> bool {
        self.pending_states()
            .remove(state)
            .is_some_and(|issued| issued.elapsed() < STATE_TTL)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/oauth2callback", get(oauth_callback))
        .route("/forms", post(create_form))
        .route("/sample.json", get(sample_json))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(config: MagicformConfig, addr: SocketAddr) -> anyhow::Result<()> {
    let redirect_uri = config
        .oauth
        .redirect_uri
        .clone()
        .unwrap_or_else(|| format!("http://{addr}/oauth2callback"));
    let auth = Authenticator::from_config(&config)?;
    let state = AppState::new(config, auth, redirect_uri);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    match state.inner.auth.stored_token().await {
        Ok(Some(_)) => return Ok(Html(html::render_upload_form())),
        Ok(None) => {}
        Err(e) if e.requires_reauthorization() => {
            tracing::warn!("{e}");
            state
                .inner
                .auth
                .store()
                .remove()
                .map_err(|e| WebError::Upstream(e.into()))?;
        }
        Err(e) => return Err(WebError::Upstream(e.into())),
    }

    let (url, oauth_state) = state
        .inner
        .auth
        .begin_authorization(&state.inner.redirect_uri)
        .map_err(|e| WebError::Upstream(e.into()))?;
    state.remember_state(oauth_state);
    Ok(Html(html::render_authorize(&url)))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, WebError> {
    if let Some(error) = query.error {
        return Err(WebError::BadRequest(format!("authorization denied: {error}")));
    }
    let Some(code) = query.code else {
        return Err(WebError::BadRequest(
            "Authorization code not found in the URL.".into(),
        ));
    };
    if !query.state.as_deref().is_some_and(|s| state.take_state(s)) {
        return Err(WebError::BadRequest("authorization state mismatch".into()));
    }

    state
        .inner
        .auth
        .authorize_with_code(&code, &state.inner.redirect_uri)
        .await
        .map_err(|e| WebError::Upstream(e.into()))?;
    tracing::info!("authorization completed");
    Ok(Redirect::to("/"))
}

async fn create_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, WebError> {
    let mut title = String::new();
    let mut questions: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| WebError::BadRequest(e.to_string()))?;
            }
            "questions" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::BadRequest(e.to_string()))?;
                questions = Some(bytes).filter(|b| !b.is_empty());
            }
            _ => {}
        }
    }

    let (title, questions) = match (title.trim(), questions) {
        (t, Some(q)) if !t.is_empty() => (t.to_string(), q),
        _ => {
            return Err(WebError::BadRequest(
                "Please enter the form title and upload the questions JSON file.".into(),
            ))
        }
    };

    let set = parse_question_set_reader(questions.as_ref())
        .map_err(|e| WebError::BadRequest(format!("{e:#}")))?;

    let token = state
        .inner
        .auth
        .stored_token()
        .await
        .map_err(|e| WebError::Upstream(e.into()))?
        .ok_or(WebError::Unauthorized)?;

    let config = &state.inner.config;
    let service = GoogleFormsClient::new(
        &token.token,
        Some(config.forms_base_url.clone()),
        Some(config.timeout_secs),
    )
    .map_err(|e| WebError::Upstream(e.into()))?;
    let builder = FormBuilder::new(Arc::new(service), config.builder_config());

    let outcome = builder
        .build(&title, &set, &NoopReporter)
        .await
        .map_err(WebError::Upstream)?;
    tracing::info!(
        form_id = %outcome.form.form_id,
        created = outcome.questions.created,
        "form created from upload"
    );
    Ok(Html(html::render_result(&outcome)))
}

async fn sample_json() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"questions.json\"",
            ),
        ],
        SAMPLE_QUESTIONS_JSON,
    )
}
