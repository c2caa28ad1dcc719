//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時のセッションからの退出と在室表示の更新
//!
//! ### なぜこのテストが必要か
//! - 切断は投票の状態に影響しない（投票は参加者の在室と無関係に続く）
//! - 同じ接続の二重切断は何もしない
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加済みの接続の切断
//! - エッジケース：参加前の接続、二重切断

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, SessionId},
    infrastructure::{Broadcaster, SessionRegistry},
};

use super::presence::broadcast_participants;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<SessionRegistry>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Some(SessionId)` - 退出したセッション（残りのメンバーに在室を配信済み）
    /// * `None` - どのセッションにも参加していなかった
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<SessionId> {
        let vacated = self.registry.disconnect(connection_id).await;
        if let Some(session_id) = &vacated {
            broadcast_participants(&self.registry, &self.broadcaster, session_id).await;
            tracing::info!(
                connection_id = %connection_id,
                session_id = %session_id,
                "Participant left session"
            );
        }
        vacated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ParticipantName, PollDraft, Role},
        usecase::test_support::{Harness, session_id},
    };

    fn usecase(h: &Harness) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(h.registry.clone(), h.broadcaster.clone())
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_members() {
        // テスト項目: 切断すると残りのメンバーに在室更新が届く
        // given (前提条件):
        let h = Harness::new();
        let mut teacher = h.joined("s1", Role::Teacher, None).await;
        let student = h.joined("s1", Role::Student, Some("alice")).await;

        // when (操作):
        let vacated = usecase(&h).execute(&student.id).await;

        // then (期待する結果):
        assert_eq!(vacated, Some(session_id("s1")));
        let frames = teacher.drain();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "participantsUpdate");
        let participants = frames[0]["data"]["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["role"], "teacher");
        assert_eq!(h.registry.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_noop() {
        // テスト項目: 二重切断・参加前の切断は何もしない
        // given (前提条件):
        let h = Harness::new();
        let student = h.joined("s1", Role::Student, Some("alice")).await;
        let lurker = h.connect().await;
        usecase(&h).execute(&student.id).await;

        // when (操作):
        let again = usecase(&h).execute(&student.id).await;
        let never_joined = usecase(&h).execute(&lurker.id).await;

        // then (期待する結果):
        assert_eq!(again, None);
        assert_eq!(never_joined, None);
        assert_eq!(h.registry.count_connections().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_active_poll() {
        // テスト項目: 切断しても実施中の投票はそのまま
        // given (前提条件):
        let h = Harness::new();
        let teacher = h.joined("s1", Role::Teacher, None).await;
        let draft = PollDraft::new(
            session_id("s1"),
            "Ready?",
            vec!["yes".to_string(), "no".to_string()],
            30,
            Vec::new(),
            ParticipantName::new("teacher").unwrap(),
        )
        .unwrap();
        let poll = h.lifecycle.create_poll(draft).await.unwrap();

        // when (操作):
        usecase(&h).execute(&teacher.id).await;

        // then (期待する結果):
        assert_eq!(
            h.lifecycle.get_active(&session_id("s1")).await.map(|p| p.id),
            Some(poll.id)
        );
    }
}
