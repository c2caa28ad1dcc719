//! Route table.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handler, state::AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);
    Router::new()
        .route("/ws", get(handler::websocket_handler))
        .route("/api/health", get(handler::health_check))
        .route(
            "/api/polls/session/{session_id}/active",
            get(handler::get_active_poll),
        )
        .route(
            "/api/polls/session/{session_id}/history",
            get(handler::get_poll_history),
        )
        .route("/api/polls/{poll_id}/results", get(handler::get_poll_results))
        .route("/api/polls/{poll_id}", get(handler::get_poll))
        .route(
            "/api/chat/session/{session_id}",
            get(handler::get_session_messages),
        )
        .route("/api/chat/poll/{scope}", get(handler::get_scope_messages))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the query API (GET only).
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
                None
            }
        })
        .collect();
    tracing::debug!(origins = ?origins, "CORS restricted to configured origins");
    layer.allow_origin(AllowOrigin::list(allowed))
}
