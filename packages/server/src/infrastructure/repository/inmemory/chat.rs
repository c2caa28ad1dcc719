//! InMemory Chat Repository 実装
//!
//! ChatRepository trait のインメモリ実装。メッセージは到着順に追記されます。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, ChatRepository, ChatScope, RepositoryError, SessionId, Timestamp};

/// インメモリ Chat Repository 実装
#[derive(Default)]
pub struct InMemoryChatRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn insert(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }

    async fn find_by_scope(
        &self,
        session_id: &SessionId,
        scope: &ChatScope,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut matched: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| &m.session_id == session_id && &m.scope == scope)
            .cloned()
            .collect();
        // stable sort keeps arrival order for equal timestamps
        matched.sort_by_key(|m| m.timestamp);
        Ok(matched)
    }

    async fn find_recent_by_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut matched: Vec<ChatMessage> = messages
            .iter()
            .rev()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn delete_older_than(&self, cutoff: Timestamp) -> Result<usize, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|m| m.timestamp >= cutoff);
        Ok(before - messages.len())
    }
}
