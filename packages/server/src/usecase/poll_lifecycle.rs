//! UseCase: 投票のライフサイクル（作成 → 実施中 → 終了）
//!
//! ## 排他制御
//!
//! - セッションごとのスロット: 「実施中の投票があるか」を保持し、作成時の
//!   存在確認・保存・有効化を一つの操作として直列化する
//! - 投票ごとのロック: 投票の重複確認・選択肢確認・追加と、終了の遷移を直列化する
//!
//! 作成はスロットを保持したまま新しい投票のロックを取る（この時点で他からは参照できない）。
//! 終了は投票ロックを解放してからスロットを取る。
//!
//! ## 配信の順序
//!
//! 開始・投票・tick・途中参加の再送は [`PollGuard`] を保持したまま配信する。
//! 終了は同じロックを取るので、セッションに届くイベントの順序は状態遷移の順序と一致する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 作成の直列化、投票エラーの優先順位、終了の単一勝者
//! - ストア障害時の振る舞い
//! - 保存中の投票が履歴に終了済みとして現れないこと
//!
//! ### なぜこのテストが必要か
//! - 同一セッションに実施中の投票が 2 つできたり、同じ生徒の票が 2 つ入ってはならない

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use kyoshitsu_shared::time::get_jst_timestamp;

use crate::domain::{
    EndCause, ParticipantName, Poll, PollDraft, PollError, PollId, PollIdFactory, PollRepository,
    PollResults, SessionId, TallyEntry, Timestamp,
};

use super::error::UseCaseError;

/// 実施中の投票のロック。破棄するまで同じ投票への投票・終了は待たされる
pub type PollGuard = OwnedMutexGuard<Poll>;

#[derive(Default)]
struct SessionSlot {
    active: Option<PollId>,
}

/// 受理された投票の結果
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    /// 投票適用後のスナップショット
    pub poll: Poll,
    pub tally: Vec<TallyEntry>,
}

/// 投票ライフサイクルの管理
pub struct PollLifecycle {
    store: Arc<dyn PollRepository>,
    slots: Mutex<HashMap<SessionId, Arc<Mutex<SessionSlot>>>>,
    active: RwLock<HashMap<PollId, Arc<Mutex<Poll>>>>,
}

impl PollLifecycle {
    pub fn new(store: Arc<dyn PollRepository>) -> Self {
        Self {
            store,
            slots: Mutex::new(HashMap::new()),
            active: RwLock::new(HashMap::new()),
        }
    }

    /// 新しい投票を開始する
    ///
    /// # Errors
    ///
    /// * `UseCaseError::ActivePollExists` - セッションに実施中の投票がある
    /// * `UseCaseError::Persistence` - ストアへの保存に失敗（投票は開始されない）
    pub async fn create_poll(&self, draft: PollDraft) -> Result<Poll, UseCaseError> {
        let poll = self.start_poll(draft).await?;
        Ok(poll.clone())
    }

    /// [`create_poll`](Self::create_poll) と同じだが、投票ロックを保持したまま返す
    ///
    /// 保存中もメモリ上では実施中として登録しておき、履歴に終了済みとして現れないようにする。
    pub async fn start_poll(&self, draft: PollDraft) -> Result<PollGuard, UseCaseError> {
        let session_id = draft.session_id.clone();
        let slot = self.slot(&session_id).await;
        let mut slot = slot.lock().await;

        if slot.active.is_some() {
            return Err(UseCaseError::ActivePollExists(session_id.into_string()));
        }

        let poll = Poll::start(
            PollIdFactory::generate(),
            draft,
            Timestamp::new(get_jst_timestamp()),
        );
        let poll_id = poll.id.clone();
        let handle = Arc::new(Mutex::new(poll));
        let mut guard = handle.clone().lock_owned().await;
        self.active.write().await.insert(poll_id.clone(), handle);

        if let Err(e) = self.store.insert(&guard).await {
            self.active.write().await.remove(&poll_id);
            // ロック待ちの操作には終了済みとして見せる
            let _ = guard.end();
            return Err(e.into());
        }
        slot.active = Some(poll_id);

        tracing::info!(
            poll_id = %guard.id,
            session_id = %guard.session_id,
            options = guard.options.len(),
            duration = guard.duration_seconds,
            "Poll started"
        );
        Ok(guard)
    }

    /// 投票を受け付ける
    ///
    /// エラーの優先順位: 投票なし → 終了済み → 重複 → 不正な選択肢。
    /// 他セッションの投票は存在しないものとして扱う。
    /// 票はストアへの追加が成功してからメモリに反映する。
    pub async fn submit_vote(
        &self,
        session_id: &SessionId,
        poll_id: &PollId,
        student_name: &ParticipantName,
        option: &str,
    ) -> Result<VoteOutcome, UseCaseError> {
        let poll = self
            .accept_vote(session_id, poll_id, student_name, option)
            .await?;
        Ok(VoteOutcome {
            tally: poll.compute_tally(),
            poll: poll.clone(),
        })
    }

    /// [`submit_vote`](Self::submit_vote) と同じだが、票を反映した投票をロックしたまま返す
    pub async fn accept_vote(
        &self,
        session_id: &SessionId,
        poll_id: &PollId,
        student_name: &ParticipantName,
        option: &str,
    ) -> Result<PollGuard, UseCaseError> {
        let Some(handle) = self.handle(poll_id).await else {
            return match self.store.find_by_id(poll_id).await? {
                Some(stored) if &stored.session_id == session_id => {
                    Err(PollError::PollEnded.into())
                }
                _ => Err(UseCaseError::PollNotFound(poll_id.to_string())),
            };
        };

        let mut poll = handle.lock_owned().await;
        if &poll.session_id != session_id {
            return Err(UseCaseError::PollNotFound(poll_id.to_string()));
        }
        let vote = poll.check_vote(student_name, option)?;
        self.store.append_vote(poll_id, &vote).await?;
        poll.record_vote(vote);

        tracing::debug!(
            poll_id = %poll_id,
            student = %student_name,
            total_votes = poll.total_votes(),
            "Vote accepted"
        );
        Ok(poll)
    }

    /// 投票を終了する
    ///
    /// 成功するのは最初の呼び出しだけで、以降は `AlreadyEnded` になる。
    /// 終了のストア反映に失敗してもログに残すだけで、投票は終了したものとして扱う。
    pub async fn end_poll(&self, poll_id: &PollId, cause: EndCause) -> Result<Poll, UseCaseError> {
        let Some(handle) = self.handle(poll_id).await else {
            return match self.store.find_by_id(poll_id).await? {
                Some(_) => Err(PollError::AlreadyEnded.into()),
                None => Err(UseCaseError::PollNotFound(poll_id.to_string())),
            };
        };

        let ended = {
            let mut poll = handle.lock().await;
            poll.end()?;
            poll.clone()
        };

        self.active.write().await.remove(poll_id);
        if let Some(slot) = self.existing_slot(&ended.session_id).await {
            let mut slot = slot.lock().await;
            if slot.active.as_ref() == Some(poll_id) {
                slot.active = None;
            }
        }

        if let Err(e) = self.store.mark_ended(poll_id).await {
            tracing::error!(poll_id = %poll_id, "Failed to persist poll end: {}", e);
        }

        tracing::info!(
            poll_id = %poll_id,
            session_id = %ended.session_id,
            ?cause,
            total_votes = ended.total_votes(),
            "Poll ended"
        );
        Ok(ended)
    }

    /// セッションで実施中の投票
    pub async fn get_active(&self, session_id: &SessionId) -> Option<Poll> {
        let poll = self.lock_active_in(session_id).await?;
        Some(poll.clone())
    }

    /// セッションで実施中の投票をロックする
    pub async fn lock_active_in(&self, session_id: &SessionId) -> Option<PollGuard> {
        let poll_id = {
            let slot = self.existing_slot(session_id).await?;
            let slot = slot.lock().await;
            slot.active.clone()?
        };
        self.lock_active(&poll_id).await
    }

    /// 投票が実施中ならロックして返す。終了済み・不明なら `None`
    pub async fn lock_active(&self, poll_id: &PollId) -> Option<PollGuard> {
        let handle = self.handle(poll_id).await?;
        let poll = handle.lock_owned().await;
        if poll.active {
            Some(poll)
        } else {
            None
        }
    }

    /// セッションの終了済み投票（新しい順）
    pub async fn get_history(&self, session_id: &SessionId) -> Result<Vec<Poll>, UseCaseError> {
        let stored = self.store.find_by_session(session_id, None).await?;
        let active = self.active.read().await;
        Ok(stored
            .into_iter()
            .filter(|poll| !active.contains_key(&poll.id))
            .map(mark_inactive)
            .collect())
    }

    /// 投票を ID で取得（実施中ならメモリ上の最新状態）
    pub async fn get_poll(&self, poll_id: &PollId) -> Result<Option<Poll>, UseCaseError> {
        if let Some(handle) = self.handle(poll_id).await {
            return Ok(Some(handle.lock().await.clone()));
        }
        Ok(self.store.find_by_id(poll_id).await?.map(mark_inactive))
    }

    /// 投票の集計結果
    pub async fn get_results(&self, poll_id: &PollId) -> Result<PollResults, UseCaseError> {
        self.get_poll(poll_id)
            .await?
            .map(|poll| poll.results())
            .ok_or_else(|| UseCaseError::PollNotFound(poll_id.to_string()))
    }

    async fn handle(&self, poll_id: &PollId) -> Option<Arc<Mutex<Poll>>> {
        self.active.read().await.get(poll_id).cloned()
    }

    async fn slot(&self, session_id: &SessionId) -> Arc<Mutex<SessionSlot>> {
        let mut slots = self.slots.lock().await;
        slots.entry(session_id.clone()).or_default().clone()
    }

    async fn existing_slot(&self, session_id: &SessionId) -> Option<Arc<Mutex<SessionSlot>>> {
        self.slots.lock().await.get(session_id).cloned()
    }
}

/// メモリ上で実施中でない投票は、ストアの状態に関わらず終了済み
fn mark_inactive(mut poll: Poll) -> Poll {
    poll.active = false;
    poll
}
