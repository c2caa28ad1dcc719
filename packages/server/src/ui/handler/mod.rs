//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{
    get_active_poll, get_poll, get_poll_history, get_poll_results, get_scope_messages,
    get_session_messages, health_check,
};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
