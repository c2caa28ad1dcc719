//! HTTP API endpoint handlers (read-only query surface).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    domain::{ChatScope, PollId, SessionId},
    infrastructure::dto::{
        http::{ActivePollDto, ChatMessageDto, ErrorResponseDto},
        websocket::{PollDto, PollResultsDto},
    },
    ui::state::AppState,
    usecase::{ErrorCategory, QueryUseCase, UseCaseError},
};

/// Query parameters for scope-based chat lookup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeQuery {
    pub session_id: String,
}

/// Error response with a status derived from the error category
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        let status = match e.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::NotAuthorized => StatusCode::FORBIDDEN,
            ErrorCategory::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("HTTP query failed: {}", e);
        } else {
            tracing::debug!("HTTP query rejected: {}", e);
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<crate::domain::ValueObjectError> for ApiError {
    fn from(e: crate::domain::ValueObjectError) -> Self {
        UseCaseError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponseDto {
                message: self.message,
            }),
        )
            .into_response()
    }
}

fn query(state: &AppState) -> QueryUseCase {
    QueryUseCase::new(
        state.lifecycle.clone(),
        state.timer.clone(),
        state.chat_store.clone(),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Active poll of a session with its remaining time
pub async fn get_active_poll(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ActivePollDto>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let (poll, remaining_time) = query(&state)
        .active_poll(&session_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No active poll in session {session_id}")))?;

    Ok(Json(ActivePollDto {
        poll: PollDto::from(&poll),
        remaining_time,
    }))
}

/// Ended polls of a session, newest first
pub async fn get_poll_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<PollDto>>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let history = query(&state).poll_history(&session_id).await?;
    Ok(Json(history.iter().map(PollDto::from).collect()))
}

pub async fn get_poll_results(
    State(state): State<Arc<AppState>>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResultsDto>, ApiError> {
    let poll_id = PollId::new(poll_id)?;
    let results = query(&state).poll_results(&poll_id).await?;
    Ok(Json(PollResultsDto::from(&results)))
}

pub async fn get_poll(
    State(state): State<Arc<AppState>>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollDto>, ApiError> {
    let poll_id = PollId::new(poll_id)?;
    let poll = query(&state)
        .poll(&poll_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Poll not found: {poll_id}")))?;
    Ok(Json(PollDto::from(&poll)))
}

/// Most recent chat messages of a session, newest first
pub async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let messages = query(&state).recent_messages(&session_id).await?;
    Ok(Json(messages.iter().map(ChatMessageDto::from).collect()))
}

/// Chat messages of a poll (or the lobby), oldest first
pub async fn get_scope_messages(
    State(state): State<Arc<AppState>>,
    Path(scope): Path<String>,
    Query(params): Query<ScopeQuery>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let scope = ChatScope::parse(&scope)?;
    let session_id = SessionId::new(params.session_id)?;
    let messages = query(&state).messages_for_scope(&session_id, &scope).await?;
    Ok(Json(messages.iter().map(ChatMessageDto::from).collect()))
}
