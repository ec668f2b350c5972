//! HTTP routes over the session manager.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use frontdesk_conversation::{FeedbackRecord, LeadRecord, ProviderCredentials};
use frontdesk_core::SessionId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const READY: &str = "Agent initialized successfully! You can start chatting.";

/// Body of a session initialization request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Provider key; the configured key is used when absent or blank.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl InitializeRequest {
    fn credentials(&self) -> ProviderCredentials {
        self.api_key
            .as_deref()
            .map_or_else(ProviderCredentials::none, ProviderCredentials::new)
    }
}

/// Response to a successful (re)initialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub status: String,
}

/// Body of a chat message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// The assistant's reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageReply {
    pub reply: String,
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", delete(end_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .route("/api/sessions/{id}/initialize", post(reinitialize_session))
        .route("/api/leads", get(list_leads))
        .route("/api/feedback", get(list_feedback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse().map_err(|e: frontdesk_core::ParseIdError| ApiError::SessionNotFound {
        detail: e.to_string(),
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InitializeRequest>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let id = state.sessions.initialize(&request.credentials()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id.to_string(),
            status: READY.to_string(),
        }),
    ))
}

async fn reinitialize_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<InitializeRequest>,
) -> Result<Json<SessionCreated>, ApiError> {
    let id = parse_id(&id)?;
    state
        .sessions
        .reinitialize(id, &request.credentials())
        .await?;

    Ok(Json(SessionCreated {
        session_id: id.to_string(),
        status: READY.to_string(),
    }))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageReply>, ApiError> {
    let id = parse_id(&id)?;
    let reply = state.sessions.submit(id, &request.message).await?;
    Ok(Json(MessageReply { reply }))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.sessions.reset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.sessions.end(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_leads(State(state): State<Arc<AppState>>) -> Json<Vec<LeadRecord>> {
    Json(state.leads.list().await)
}

async fn list_feedback(State(state): State<Arc<AppState>>) -> Json<Vec<FeedbackRecord>> {
    Json(state.feedback.list().await)
}
