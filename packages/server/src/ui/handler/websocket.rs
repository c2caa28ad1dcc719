//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ChatScope, ConnectionId, PollId, Role, SessionId},
    infrastructure::dto::websocket::{
        ClientEvent, CreatePollPayload, EndPollPayload, JoinPayload, KickStudentPayload,
        SendMessagePayload, ServerEvent, SubmitVotePayload,
    },
    ui::state::AppState,
    usecase::{
        ConnectParticipantUseCase, CreatePollUseCase, DisconnectParticipantUseCase,
        EndPollUseCase, ErrorCategory, JoinSessionUseCase, KickStudentUseCase, NewPoll,
        SendMessageUseCase, SubmitVoteUseCase, UseCaseError,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection_id = ConnectParticipantUseCase::new(state.registry.clone())
        .execute(tx)
        .await;

    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();

    // Spawn a task to receive events from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(connection_id = %recv_connection_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_frame(&recv_state, &recv_connection_id, text.as_str()).await;
                }
                Message::Binary(_) => {
                    report(
                        &recv_state,
                        &recv_connection_id,
                        "Binary frames are not supported",
                        ErrorCategory::Validation,
                    )
                    .await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(connection_id = %recv_connection_id, "Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward queued events to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    DisconnectParticipantUseCase::new(state.registry.clone(), state.broadcaster.clone())
        .execute(&connection_id)
        .await;
    tracing::debug!(%connection_id, "Connection handler finished");
}

/// Parse one text frame and run the matching use case.
async fn handle_frame(state: &Arc<AppState>, connection_id: &ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(%connection_id, "Malformed frame: {}", e);
            report(
                state,
                connection_id,
                &format!("Invalid message: {e}"),
                ErrorCategory::Validation,
            )
            .await;
            return;
        }
    };

    let name = event.name();
    tracing::debug!(%connection_id, event = name, "Received event");

    if let Err(e) = dispatch(state, connection_id, event).await {
        if e.is_client_fault() {
            tracing::warn!(%connection_id, event = name, "Rejected: {}", e);
        } else {
            tracing::error!(%connection_id, event = name, "Failed: {}", e);
        }
        report(state, connection_id, &e.to_string(), e.category()).await;
    }
}

async fn dispatch(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    event: ClientEvent,
) -> Result<(), UseCaseError> {
    match event {
        ClientEvent::Join(payload) => join(state, connection_id, payload).await,
        ClientEvent::CreatePoll(payload) => create_poll(state, connection_id, payload).await,
        ClientEvent::SubmitVote(payload) => submit_vote(state, connection_id, payload).await,
        ClientEvent::EndPoll(payload) => end_poll(state, connection_id, payload).await,
        ClientEvent::SendMessage(payload) => send_message(state, connection_id, payload).await,
        ClientEvent::KickStudent(payload) => kick_student(state, connection_id, payload).await,
    }
}

async fn join(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: JoinPayload,
) -> Result<(), UseCaseError> {
    // Convert String -> Domain Models
    let session_id = SessionId::new(payload.session_id)?;
    let role = Role::try_from(payload.role.as_str())?;

    let usecase = JoinSessionUseCase::new(
        state.registry.clone(),
        state.lifecycle.clone(),
        state.timer.clone(),
        state.broadcaster.clone(),
    );
    usecase
        .execute(
            connection_id,
            &session_id,
            role,
            payload.student_name.as_deref(),
        )
        .await?;
    Ok(())
}

async fn create_poll(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: CreatePollPayload,
) -> Result<(), UseCaseError> {
    let session_id = SessionId::new(payload.session_id)?;
    let request = NewPoll {
        question: payload.question,
        options: payload.options,
        duration_seconds: payload.duration,
        correct_answers: payload.correct_answers,
    };

    let usecase = CreatePollUseCase::new(
        state.registry.clone(),
        state.lifecycle.clone(),
        state.timer.clone(),
        state.broadcaster.clone(),
    );
    usecase.execute(connection_id, &session_id, request).await?;
    Ok(())
}

async fn submit_vote(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: SubmitVotePayload,
) -> Result<(), UseCaseError> {
    let session_id = SessionId::new(payload.session_id)?;
    let poll_id = PollId::new(payload.poll_id)?;

    let usecase = SubmitVoteUseCase::new(
        state.registry.clone(),
        state.lifecycle.clone(),
        state.broadcaster.clone(),
    );
    usecase
        .execute(
            connection_id,
            &session_id,
            &poll_id,
            payload.student_name.as_deref(),
            &payload.option,
        )
        .await?;
    Ok(())
}

async fn end_poll(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: EndPollPayload,
) -> Result<(), UseCaseError> {
    let session_id = SessionId::new(payload.session_id)?;
    let poll_id = PollId::new(payload.poll_id)?;

    let usecase = EndPollUseCase::new(
        state.registry.clone(),
        state.lifecycle.clone(),
        state.timer.clone(),
        state.broadcaster.clone(),
    );
    usecase.execute(connection_id, &session_id, &poll_id).await?;
    Ok(())
}

async fn send_message(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: SendMessagePayload,
) -> Result<(), UseCaseError> {
    let session_id = SessionId::new(payload.session_id)?;
    let scope = ChatScope::parse(&payload.poll_id)?;

    let usecase = SendMessageUseCase::new(
        state.registry.clone(),
        state.chat_store.clone(),
        state.broadcaster.clone(),
    );
    usecase
        .execute(
            connection_id,
            &session_id,
            scope,
            payload.from.as_deref(),
            &payload.text,
        )
        .await?;
    Ok(())
}

async fn kick_student(
    state: &AppState,
    connection_id: &ConnectionId,
    payload: KickStudentPayload,
) -> Result<(), UseCaseError> {
    let session_id = SessionId::new(payload.session_id)?;
    let target = ConnectionId::new(payload.target_connection_id)?;

    let usecase = KickStudentUseCase::new(state.registry.clone(), state.broadcaster.clone());
    let removed = usecase.execute(connection_id, &session_id, &target).await?;
    tracing::info!(%session_id, name = %removed.name, "Student removed by teacher");
    Ok(())
}

/// Send an `error` event to the originating connection.
async fn report(
    state: &AppState,
    connection_id: &ConnectionId,
    message: &str,
    category: ErrorCategory,
) {
    let event = ServerEvent::error(message, category.as_str());
    if !state.broadcaster.to_connection(connection_id, &event).await {
        tracing::debug!(%connection_id, "Could not deliver error event");
    }
}
