//! InMemory Poll Repository 実装
//!
//! ドメイン層が定義する PollRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 永続化の耐久性は保証しません（プロセス終了で消えます）。
//! 永続ストアを実装する際は同じ trait を実装して差し替えます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Poll, PollId, PollRepository, RepositoryError, SessionId, Vote};

struct StoredPoll {
    /// 挿入順（同時刻に開始した投票の並び順を安定させるため）
    seq: u64,
    poll: Poll,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    polls: HashMap<PollId, StoredPoll>,
}

/// インメモリ Poll Repository 実装
#[derive(Default)]
pub struct InMemoryPollRepository {
    inner: Mutex<Inner>,
}

impl InMemoryPollRepository {
    /// 新しい InMemoryPollRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されている投票数
    pub async fn count(&self) -> usize {
        self.inner.lock().await.polls.len()
    }
}

#[async_trait]
impl PollRepository for InMemoryPollRepository {
    async fn insert(&self, poll: &Poll) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.polls.insert(
            poll.id.clone(),
            StoredPoll {
                seq,
                poll: poll.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, poll_id: &PollId) -> Result<Option<Poll>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.polls.get(poll_id).map(|stored| stored.poll.clone()))
    }

    async fn find_by_session(
        &self,
        session_id: &SessionId,
        active: Option<bool>,
    ) -> Result<Vec<Poll>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut matched: Vec<&StoredPoll> = inner
            .polls
            .values()
            .filter(|stored| &stored.poll.session_id == session_id)
            .filter(|stored| active.is_none_or(|a| stored.poll.active == a))
            .collect();
        // newest first
        matched.sort_by(|a, b| {
            b.poll
                .start_time
                .cmp(&a.poll.start_time)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(matched.into_iter().map(|stored| stored.poll.clone()).collect())
    }

    async fn append_vote(&self, poll_id: &PollId, vote: &Vote) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .polls
            .get_mut(poll_id)
            .ok_or_else(|| RepositoryError::PollNotFound(poll_id.to_string()))?;
        stored.poll.votes.push(vote.clone());
        Ok(())
    }

    async fn mark_ended(&self, poll_id: &PollId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .polls
            .get_mut(poll_id)
            .ok_or_else(|| RepositoryError::PollNotFound(poll_id.to_string()))?;
        stored.poll.active = false;
        Ok(())
    }

    async fn delete(&self, poll_id: &PollId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.polls.remove(poll_id).is_some())
    }
}
