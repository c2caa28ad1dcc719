//! UseCase: 読み取り専用の問い合わせ（HTTP API 向け）

use std::sync::Arc;

use kyoshitsu_shared::time::get_jst_timestamp;

use crate::domain::{
    ChatMessage, ChatRepository, ChatScope, Poll, PollId, PollResults, SessionId, Timestamp,
};

use super::{error::UseCaseError, poll_lifecycle::PollLifecycle, poll_timer::PollTimer};

/// セッションの最近のメッセージとして返す件数
pub const RECENT_MESSAGES_LIMIT: usize = 50;

/// 投票・チャットの問い合わせ
pub struct QueryUseCase {
    lifecycle: Arc<PollLifecycle>,
    timer: Arc<PollTimer>,
    chat: Arc<dyn ChatRepository>,
}

impl QueryUseCase {
    pub fn new(
        lifecycle: Arc<PollLifecycle>,
        timer: Arc<PollTimer>,
        chat: Arc<dyn ChatRepository>,
    ) -> Self {
        Self {
            lifecycle,
            timer,
            chat,
        }
    }

    /// 実施中の投票と残り秒数
    pub async fn active_poll(&self, session_id: &SessionId) -> Option<(Poll, u32)> {
        let poll = self.lifecycle.get_active(session_id).await?;
        let remaining = match self.timer.remaining(&poll.id).await {
            Some(remaining) => remaining,
            None => poll.remaining_seconds(Timestamp::new(get_jst_timestamp())),
        };
        Some((poll, remaining))
    }

    pub async fn poll_history(&self, session_id: &SessionId) -> Result<Vec<Poll>, UseCaseError> {
        self.lifecycle.get_history(session_id).await
    }

    pub async fn poll(&self, poll_id: &PollId) -> Result<Option<Poll>, UseCaseError> {
        self.lifecycle.get_poll(poll_id).await
    }

    pub async fn poll_results(&self, poll_id: &PollId) -> Result<PollResults, UseCaseError> {
        self.lifecycle.get_results(poll_id).await
    }

    /// 投票（またはロビー）のメッセージ（古い順）
    pub async fn messages_for_scope(
        &self,
        session_id: &SessionId,
        scope: &ChatScope,
    ) -> Result<Vec<ChatMessage>, UseCaseError> {
        Ok(self.chat.find_by_scope(session_id, scope).await?)
    }

    /// セッションの最近のメッセージ（新しい順）
    pub async fn recent_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, UseCaseError> {
        Ok(self
            .chat
            .find_recent_by_session(session_id, RECENT_MESSAGES_LIMIT)
            .await?)
    }
}
