//! UseCase: 投票の作成
//!
//! 教師だけが自分のセッションに投票を作成できる。作成者は登録済みの名前になる。
//! 作成に成功したら `pollStarted` を配信し、カウントダウンを開始する。
//! どちらも投票ロックを保持したまま行うので、同時に届いた `endPoll` は
//! タイマー登録の後に処理され、`pollEnded` が `pollStarted` より先に届くことはない。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Poll, PollDraft, SessionId},
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

use super::{
    access::teacher_of, error::UseCaseError, poll_lifecycle::PollLifecycle, poll_timer::PollTimer,
};

/// 作成リクエストの内容
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
    pub duration_seconds: u32,
    pub correct_answers: Vec<String>,
}

/// 投票作成のユースケース
pub struct CreatePollUseCase {
    registry: Arc<SessionRegistry>,
    lifecycle: Arc<PollLifecycle>,
    timer: Arc<PollTimer>,
    broadcaster: Arc<Broadcaster>,
}

impl CreatePollUseCase {
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

    /// 投票の作成を実行
    ///
    /// # Errors
    ///
    /// * `UseCaseError::NotJoined` / `NotAuthorized` - 呼び出し元がこのセッションの教師でない
    /// * `UseCaseError::Poll` - 入力の検証に失敗
    /// * `UseCaseError::ActivePollExists` - 実施中の投票がある
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        request: NewPoll,
    ) -> Result<Poll, UseCaseError> {
        let teacher = teacher_of(&self.registry, connection_id, session_id).await?;

        let draft = PollDraft::new(
            session_id.clone(),
            &request.question,
            request.options,
            request.duration_seconds,
            request.correct_answers,
            teacher.name,
        )?;
        let poll = self.lifecycle.start_poll(draft).await?;

        self.broadcaster
            .to_session(
                session_id,
                &ServerEvent::poll_started(&poll, poll.duration_seconds),
            )
            .await;
        self.timer
            .start(poll.id.clone(), session_id.clone(), poll.duration_seconds)
            .await;

        Ok(poll.clone())
    }
}
