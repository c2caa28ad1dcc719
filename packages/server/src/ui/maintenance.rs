//! Background chat retention sweep.
//!
//! Periodically deletes chat messages older than the configured retention
//! period. The task stops when the application state shuts down.

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;

use crate::{ui::state::AppState, usecase::PurgeChatHistoryUseCase};

/// Spawn the sweep and register it with the state so `shutdown` awaits it.
pub async fn spawn_retention_sweep(state: Arc<AppState>, every: Duration) {
    let usecase = PurgeChatHistoryUseCase::new(state.chat_store.clone(), state.chat_retention_days);
    let mut stop = state.stop_signal();

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 1 回目の tick は即時に完了するため読み捨てる
        interval.tick().await;

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    match usecase.execute().await {
                        Ok(0) => tracing::debug!("Chat retention sweep: nothing to purge"),
                        Ok(_) => {}
                        Err(e) => tracing::error!("Chat retention sweep failed: {}", e),
                    }
                }
            }
        }
        tracing::debug!("Chat retention sweep stopped");
    });

    state.track(handle).await;
}
