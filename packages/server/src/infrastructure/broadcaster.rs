//! Fan-out of server events to connections.
//!
//! Events are serialized once and pushed into each recipient's outbound
//! channel. A closed channel only means the recipient is going away; the
//! failure is logged and delivery to the others continues.

use std::sync::Arc;

use crate::domain::{ConnectionId, SessionId};

use super::{dto::websocket::ServerEvent, session_registry::SessionRegistry};

pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every member of a session.
    ///
    /// Returns how many connections accepted the frame.
    pub async fn to_session(&self, session_id: &SessionId, event: &ServerEvent) -> usize {
        let Some(json) = encode(event) else {
            return 0;
        };
        let mut delivered = 0;
        for (connection_id, sender) in self.registry.session_senders(session_id).await {
            if sender.send(json.clone()).is_err() {
                tracing::warn!(
                    connection_id = %connection_id,
                    event = event.name(),
                    "Failed to deliver event"
                );
            } else {
                delivered += 1;
            }
        }
        tracing::debug!(
            session_id = %session_id,
            event = event.name(),
            delivered,
            "Broadcasted event"
        );
        delivered
    }

    /// Deliver `event` to one connection. Returns whether it was accepted.
    pub async fn to_connection(&self, connection_id: &ConnectionId, event: &ServerEvent) -> bool {
        let Some(json) = encode(event) else {
            return false;
        };
        match self.registry.connection_sender(connection_id).await {
            Some(sender) => {
                if sender.send(json).is_err() {
                    tracing::warn!(
                        connection_id = %connection_id,
                        event = event.name(),
                        "Failed to deliver event"
                    );
                    return false;
                }
                true
            }
            None => false,
        }
    }
}

/// Serialize an event to a text frame.
pub fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_json() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(event = event.name(), "Failed to serialize event: {}", e);
            None
        }
    }
}
