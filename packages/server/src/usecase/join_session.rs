//! UseCase: セッションへの参加
//!
//! 参加に成功した接続には次の順で送信する。
//!
//! 1. `joined`（本人のみ）
//! 2. `participantsUpdate`（セッション全体）
//! 3. 実施中の投票があれば `pollStarted` と `timerUpdate`、
//!    なければ直近に終了した投票の `pollEnded`（本人のみ）
//!
//! 3 の再送は投票ロックを保持したまま行う。参加者はすでにセッションに入っているので、
//! 再送の後に終了した場合の `pollEnded` は必ず再送より後に届く。

use std::sync::Arc;

use kyoshitsu_shared::time::get_jst_timestamp;

use crate::{
    domain::{ConnectionId, Participant, Role, SessionId, Timestamp},
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

use super::{
    error::UseCaseError, poll_lifecycle::PollLifecycle, poll_timer::PollTimer,
    presence::broadcast_participants,
};

/// セッション参加のユースケース
pub struct JoinSessionUseCase {
    registry: Arc<SessionRegistry>,
    lifecycle: Arc<PollLifecycle>,
    timer: Arc<PollTimer>,
    broadcaster: Arc<Broadcaster>,
}

impl JoinSessionUseCase {
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

    /// 参加を実行
    ///
    /// # Errors
    ///
    /// * `SessionError::StudentNameRequired` / `InvalidName` - 名前の検証に失敗
    /// * `SessionError::DuplicateName` - 同じセッションに同名の生徒がいる
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        role: Role,
        name: Option<&str>,
    ) -> Result<Participant, UseCaseError> {
        let previous = self
            .registry
            .participant(connection_id)
            .await
            .map(|p| p.session_id);

        let participant = self
            .registry
            .join(connection_id, session_id, role, name)
            .await;

        // 失敗しても元のセッションからは抜けているので、在室表示を更新する
        if let Some(previous) = previous.as_ref().filter(|p| *p != session_id) {
            broadcast_participants(&self.registry, &self.broadcaster, previous).await;
        }
        let participant = participant?;

        self.broadcaster
            .to_connection(connection_id, &ServerEvent::joined(&participant))
            .await;
        broadcast_participants(&self.registry, &self.broadcaster, session_id).await;
        self.replay_poll(connection_id, session_id).await;

        tracing::info!(
            connection_id = %connection_id,
            session_id = %session_id,
            name = %participant.name,
            role = %participant.role,
            "Joined session"
        );
        Ok(participant)
    }

    async fn replay_poll(&self, connection_id: &ConnectionId, session_id: &SessionId) {
        if let Some(poll) = self.lifecycle.lock_active_in(session_id).await {
            let remaining = match self.timer.remaining(&poll.id).await {
                Some(remaining) => remaining,
                None => poll.remaining_seconds(Timestamp::new(get_jst_timestamp())),
            };
            self.broadcaster
                .to_connection(connection_id, &ServerEvent::poll_started(&poll, remaining))
                .await;
            self.broadcaster
                .to_connection(connection_id, &ServerEvent::timer_update(&poll.id, remaining))
                .await;
            return;
        }

        match self.lifecycle.get_history(session_id).await {
            Ok(history) => {
                if let Some(latest) = history.first() {
                    self.broadcaster
                        .to_connection(connection_id, &ServerEvent::poll_ended(latest))
                        .await;
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, "Failed to load poll history: {}", e);
            }
        }
    }
}
