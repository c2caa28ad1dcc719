//! UseCase: 投票の送信
//!
//! 生徒は登録済みの名前で投票する。リクエストに名前が含まれる場合は、
//! 正規化した結果が登録済みの名前と一致しなければならない。
//! 受理されたら集計を `voteUpdate` でセッションに配信する。
//! 配信は投票ロックを保持したまま行うので、`voteUpdate` は受理順に届き、
//! その投票の `pollEnded` より後に届くことはない。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ParticipantName, PollId, SessionId},
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

use super::{
    access::student_of,
    error::UseCaseError,
    poll_lifecycle::{PollLifecycle, VoteOutcome},
};

/// 投票送信のユースケース
pub struct SubmitVoteUseCase {
    registry: Arc<SessionRegistry>,
    lifecycle: Arc<PollLifecycle>,
    broadcaster: Arc<Broadcaster>,
}

impl SubmitVoteUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        lifecycle: Arc<PollLifecycle>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            lifecycle,
            broadcaster,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        poll_id: &PollId,
        student_name: Option<&str>,
        option: &str,
    ) -> Result<VoteOutcome, UseCaseError> {
        let student = student_of(&self.registry, connection_id, session_id).await?;

        if let Some(claimed) = student_name
            && ParticipantName::new(claimed)? != student.name
        {
            return Err(UseCaseError::NotAuthorized(format!(
                "cannot vote as {}",
                claimed.trim()
            )));
        }

        let poll = self
            .lifecycle
            .accept_vote(session_id, poll_id, &student.name, option)
            .await?;
        let tally = poll.compute_tally();

        self.broadcaster
            .to_session(session_id, &ServerEvent::vote_update(&poll, &tally))
            .await;
        Ok(VoteOutcome {
            poll: poll.clone(),
            tally,
        })
    }
}
