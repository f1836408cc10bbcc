use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::{ChatEntry, TurnOutcome};
use crate::config::ConnectionSettings;

use super::AppState;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub api_key_present: bool,
    pub project_ref: String,
    pub access_token_present: bool,
    pub features: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// A user submission plus optional sidebar overrides.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub project_ref: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub features: Option<String>,
}

impl SendMessageRequest {
    fn overrides(&self) -> ConnectionSettings {
        ConnectionSettings {
            api_key: self.api_key.clone().unwrap_or_default(),
            project_ref: self.project_ref.clone().unwrap_or_default(),
            access_token: self.access_token.clone().unwrap_or_default(),
            features: self.features.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub messages: Vec<ChatEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn session_not_found(id: &Uuid) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Session '{id}' not found"))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let connection = &state.config.connection;
    Json(SettingsResponse {
        api_key_present: connection.has_api_key(),
        project_ref: connection.project_ref.clone(),
        access_token_present: connection.has_access_token(),
        features: connection.features.clone(),
        model: state.config.model.clone(),
    })
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create();
    debug!(%session_id, "session.created");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn list_messages(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(&id);
    };
    let history = session.lock().await;
    Json(history.entries().to_vec()).into_response()
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(&id);
    };
    let prompt = request.content.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message content is empty");
    }

    let settings = state.config.connection.with_overrides(&request.overrides());

    let mut history = session.lock().await;
    let outcome = state.turns.run(&mut history, prompt, &settings).await;
    let (reply, error) = match outcome {
        TurnOutcome::Reply(reply) => (Some(reply), None),
        TurnOutcome::Error(error) => (None, Some(error)),
    };

    Json(TurnResponse {
        reply,
        error,
        messages: history.entries().to_vec(),
    })
    .into_response()
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id) {
        info!(session_id = %id, "session.closed");
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/settings", get(settings))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route(
            "/api/sessions/:id/messages",
            get(list_messages).post(send_message),
        )
}
