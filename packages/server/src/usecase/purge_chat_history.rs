//! UseCase: 古いチャットメッセージの削除
//!
//! 保持期間を過ぎたメッセージをストアから削除する。定期実行は UI 層の
//! バックグラウンドタスクが行う。

use std::sync::Arc;

use kyoshitsu_shared::time::{MILLIS_PER_DAY, get_jst_timestamp};

use crate::domain::{ChatRepository, Timestamp};

use super::error::UseCaseError;

pub struct PurgeChatHistoryUseCase {
    repository: Arc<dyn ChatRepository>,
    retention_days: u32,
}

impl PurgeChatHistoryUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, retention_days: u32) -> Self {
        Self {
            repository,
            retention_days,
        }
    }

    /// 現在時刻を基準に削除する。削除した件数を返す。
    pub async fn execute(&self) -> Result<usize, UseCaseError> {
        self.execute_at(Timestamp::new(get_jst_timestamp())).await
    }

    pub async fn execute_at(&self, now: Timestamp) -> Result<usize, UseCaseError> {
        let cutoff = Timestamp::new(now.value() - i64::from(self.retention_days) * MILLIS_PER_DAY);
        let removed = self.repository.delete_older_than(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, retention_days = self.retention_days, "Purged old chat messages");
        }
        Ok(removed)
    }
}
