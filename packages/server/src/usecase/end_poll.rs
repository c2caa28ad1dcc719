//! UseCase: 投票の手動終了
//!
//! 教師による終了。終了の遷移に勝った場合だけタイマーを止めて `pollEnded` を配信する。
//! タイムアウトが先に終了させていた場合は `AlreadyEnded` を返し、何も配信しない。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, EndCause, Poll, PollId, SessionId},
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

use super::{
    access::teacher_of, error::UseCaseError, poll_lifecycle::PollLifecycle, poll_timer::PollTimer,
};

/// 投票終了のユースケース
pub struct EndPollUseCase {
    registry: Arc<SessionRegistry>,
    lifecycle: Arc<PollLifecycle>,
    timer: Arc<PollTimer>,
    broadcaster: Arc<Broadcaster>,
}

impl EndPollUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        lifecycle: Arc<PollLifecycle>,
        timer: Arc<PollTimer>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            lifecycle,
            timer,
            broadcaster,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        poll_id: &PollId,
    ) -> Result<Poll, UseCaseError> {
        teacher_of(&self.registry, connection_id, session_id).await?;

        let belongs_here = self
            .lifecycle
            .get_poll(poll_id)
            .await?
            .is_some_and(|poll| &poll.session_id == session_id);
        if !belongs_here {
            return Err(UseCaseError::PollNotFound(poll_id.to_string()));
        }

        let ended = self.lifecycle.end_poll(poll_id, EndCause::Manual).await?;
        // タイマーの停止を待ってから配信し、pollEnded の後に tick が届かないようにする
        self.timer.cancel(poll_id).await;
        self.broadcaster
            .to_session(session_id, &ServerEvent::poll_ended(&ended))
            .await;
        Ok(ended)
    }
}
