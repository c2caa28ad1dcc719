//! Domain factories for creating domain entities and value objects.

use super::{ConnectionId, PollId};

/// Factory for generating ConnectionId instances.
///
/// Connection identifiers are assigned by the server when a WebSocket is
/// upgraded, separating the generation concern from validation in ConnectionId.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Factory for generating PollId instances.
pub struct PollIdFactory;

impl PollIdFactory {
    /// Generate a new PollId with a random UUID v4.
    pub fn generate() -> PollId {
        PollId::from_uuid(uuid::Uuid::new_v4())
    }
}
