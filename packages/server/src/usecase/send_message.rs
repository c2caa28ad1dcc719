//! UseCase: チャットメッセージの送信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージの検証、保存、セッションへの配信
//!
//! ### なぜこのテストが必要か
//! - メッセージは保存に成功してから配信する（保存失敗時は誰にも届かない）
//! - 送信者名は登録済みの名前（なりすまし防止）
//!
//! ### どのような状況を想定しているか
//! - 正常系：投票スコープ・ロビーへの送信
//! - 異常系：空メッセージ、長すぎるメッセージ、未参加の接続、ストア障害

use std::sync::Arc;

use kyoshitsu_shared::time::get_jst_timestamp;

use crate::{
    domain::{
        ChatMessage, ChatRepository, ChatScope, ConnectionId, MessageText, ParticipantName,
        SessionId, Timestamp,
    },
    infrastructure::{Broadcaster, SessionRegistry, dto::websocket::ServerEvent},
};

use super::{access::member_of, error::UseCaseError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    registry: Arc<SessionRegistry>,
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    broadcaster: Arc<Broadcaster>,
}

impl SendMessageUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        repository: Arc<dyn ChatRepository>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            repository,
            broadcaster,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `scope` - 投票 ID またはロビー
    /// * `from` - 送信者名（指定時は登録済みの名前と一致すること）
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存・配信したメッセージ
    /// * `Err(UseCaseError)` - 送信失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        scope: ChatScope,
        from: Option<&str>,
        text: &str,
    ) -> Result<ChatMessage, UseCaseError> {
        let sender = member_of(&self.registry, connection_id, session_id).await?;
        if let Some(claimed) = from
            && ParticipantName::new(claimed)? != sender.name
        {
            return Err(UseCaseError::NotAuthorized(format!(
                "cannot send as {}",
                claimed.trim()
            )));
        }
        let text = MessageText::new(text)?;

        let message = ChatMessage::new(
            session_id.clone(),
            scope,
            sender.name,
            text,
            Timestamp::new(get_jst_timestamp()),
        );
        self.repository.insert(&message).await?;

        self.broadcaster
            .to_session(session_id, &ServerEvent::new_message(&message))
            .await;
        tracing::debug!(
            session_id = %session_id,
            scope = %message.scope,
            from = %message.from,
            "Chat message relayed"
        );
        Ok(message)
    }
}
