//! Presence re-broadcast after membership changes.

use crate::{
    domain::SessionId,
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

/// Send the current participant list to every member of the session.
pub(crate) async fn broadcast_participants(
    registry: &SessionRegistry,
    broadcaster: &Broadcaster,
    session_id: &SessionId,
) {
    let participants = registry.list_participants(session_id).await;
    broadcaster
        .to_session(session_id, &ServerEvent::participants_update(&participants))
        .await;
}
