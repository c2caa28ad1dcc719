//! UseCase: 接続の登録
//!
//! WebSocket のアップグレード時に、サーバーが払い出した ConnectionId と
//! 送信チャネルを登録する。セッションへの参加は join で行う。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    infrastructure::{ConnectionSender, SessionRegistry},
};

/// 接続登録のユースケース
pub struct ConnectParticipantUseCase {
    registry: Arc<SessionRegistry>,
}

impl ConnectParticipantUseCase {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 新しい ConnectionId を払い出して登録する
    pub async fn execute(&self, sender: ConnectionSender) -> ConnectionId {
        let connection_id = ConnectionIdFactory::generate();
        self.registry.connect(connection_id.clone(), sender).await;
        tracing::info!(connection_id = %connection_id, "Connection registered");
        connection_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_assigns_unique_ids() {
        // テスト項目: 接続ごとに異なる ID が払い出され、登録される
        // given (前提条件):
        let registry = Arc::new(SessionRegistry::new());
        let usecase = ConnectParticipantUseCase::new(registry.clone());
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        let first = usecase.execute(tx1).await;
        let second = usecase.execute(tx2).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(registry.count_connections().await, 2);
        // 参加前なので参加者としては存在しない
        assert!(registry.participant(&first).await.is_none());
    }
}
