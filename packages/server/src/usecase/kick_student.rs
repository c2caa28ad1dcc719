//! UseCase: 生徒の強制退出
//!
//! 対象に `kicked` を送ってからセッションから外し、残りのメンバーに在室を配信する。
//! 投票の状態には影響しない（すでに入った票は残る）。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Participant, SessionId},
    infrastructure::{
        Broadcaster, SessionRegistry, broadcaster::encode, dto::websocket::ServerEvent,
    },
};

use super::{access::teacher_of, error::UseCaseError, presence::broadcast_participants};

const KICKED_MESSAGE: &str = "You have been removed from the session by the teacher";

/// 強制退出のユースケース
pub struct KickStudentUseCase {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
}

impl KickStudentUseCase {
    pub fn new(registry: Arc<SessionRegistry>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        target: &ConnectionId,
    ) -> Result<Participant, UseCaseError> {
        teacher_of(&self.registry, connection_id, session_id).await?;

        let removed = self
            .registry
            .evict(connection_id, target, |participant, sender| {
                let delivered = encode(&ServerEvent::kicked(KICKED_MESSAGE))
                    .is_some_and(|json| sender.send(json).is_ok());
                if !delivered {
                    tracing::warn!(
                        connection_id = %participant.connection_id,
                        "Failed to deliver kick notice"
                    );
                }
            })
            .await?;

        broadcast_participants(&self.registry, &self.broadcaster, session_id).await;
        Ok(removed)
    }
}
