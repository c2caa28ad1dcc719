//! UseCase: 投票のカウントダウン
//!
//! 実施中の投票ごとに 1 つのタスクを起動し、開始直後に残り時間（全体）を、
//! 以降は 1 tick ごとに 1 秒ずつ減らした残り時間を 0 まで配信する。
//! 0 に達したらタイムアウトで投票を終了し、終了に成功した場合だけ
//! `pollEnded` を配信する。
//!
//! tick ごとに投票ロックを取り、投票がすでに終了していれば何も配信せずに止まる。
//! 配信はロックを保持したまま行うので、`pollEnded` の後に `timerUpdate` は届かない。
//!
//! 停止は協調的に行う（watch チャネル）。すでに始まっている終了処理が
//! 途中で打ち切られることはない。

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{
    domain::{EndCause, PollError, PollId, SessionId},
    infrastructure::{Broadcaster, dto::websocket::ServerEvent},
};

use super::{error::UseCaseError, poll_lifecycle::PollLifecycle};

struct TimerHandle {
    generation: u64,
    cancel: watch::Sender<bool>,
    remaining: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    async fn stop(self) {
        self.cancel.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Timer task did not finish cleanly: {}", e);
        }
    }
}

type Handles = Arc<Mutex<HashMap<PollId, TimerHandle>>>;

/// 投票ごとのカウントダウンタイマー
pub struct PollTimer {
    lifecycle: Arc<PollLifecycle>,
    broadcaster: Arc<Broadcaster>,
    tick: Duration,
    handles: Handles,
    next_generation: AtomicU64,
}

impl PollTimer {
    pub fn new(lifecycle: Arc<PollLifecycle>, broadcaster: Arc<Broadcaster>, tick: Duration) -> Self {
        Self {
            lifecycle,
            broadcaster,
            tick,
            handles: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// カウントダウンを開始する（同じ投票のタイマーがあれば停止して置き換える）
    pub async fn start(&self, poll_id: PollId, session_id: SessionId, duration_seconds: u32) {
        let previous = self.handles.lock().await.remove(&poll_id);
        if let Some(previous) = previous {
            tracing::warn!(poll_id = %poll_id, "Replacing running timer");
            previous.stop().await;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let remaining = Arc::new(AtomicU32::new(duration_seconds));

        let countdown = Countdown {
            poll_id: poll_id.clone(),
            session_id,
            duration_seconds,
            tick: self.tick,
            generation,
            cancel: cancel_rx,
            remaining: remaining.clone(),
            lifecycle: self.lifecycle.clone(),
            broadcaster: self.broadcaster.clone(),
            handles: self.handles.clone(),
        };

        // タスクの後始末がハンドル登録より先に走らないよう、ロックを持ったまま起動する
        let mut handles = self.handles.lock().await;
        let task = tokio::spawn(countdown.run());
        handles.insert(
            poll_id,
            TimerHandle {
                generation,
                cancel: cancel_tx,
                remaining,
                task,
            },
        );
    }

    /// カウントダウンを停止し、タスクの終了を待つ。タイマーがなければ何もしない。
    pub async fn cancel(&self, poll_id: &PollId) {
        let handle = self.handles.lock().await.remove(poll_id);
        if let Some(handle) = handle {
            handle.stop().await;
            tracing::debug!(poll_id = %poll_id, "Timer cancelled");
        }
    }

    /// 実行中タイマーの残り秒数
    pub async fn remaining(&self, poll_id: &PollId) -> Option<u32> {
        let handles = self.handles.lock().await;
        handles
            .get(poll_id)
            .map(|h| h.remaining.load(Ordering::Acquire))
    }

    pub async fn is_running(&self, poll_id: &PollId) -> bool {
        self.handles.lock().await.contains_key(poll_id)
    }

    /// すべてのタイマーを停止し、全タスクの終了を待つ
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.handles.lock().await.drain().map(|(_, h)| h).collect();
        let count = drained.len();
        for handle in drained {
            handle.stop().await;
        }
        tracing::info!(count, "Poll timers stopped");
    }
}

struct Countdown {
    poll_id: PollId,
    session_id: SessionId,
    duration_seconds: u32,
    tick: Duration,
    generation: u64,
    cancel: watch::Receiver<bool>,
    remaining: Arc<AtomicU32>,
    lifecycle: Arc<PollLifecycle>,
    broadcaster: Arc<Broadcaster>,
    handles: Handles,
}

impl Countdown {
    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.tick);
        let mut remaining = self.duration_seconds;

        loop {
            tokio::select! {
                biased;
                changed = self.cancel.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = interval.tick() => {}
            }
            if *self.cancel.borrow() {
                return;
            }

            let Some(poll) = self.lifecycle.lock_active(&self.poll_id).await else {
                tracing::debug!(poll_id = %self.poll_id, "Poll no longer active, countdown stopped");
                self.release().await;
                return;
            };
            self.remaining.store(remaining, Ordering::Release);
            self.broadcaster
                .to_session(
                    &self.session_id,
                    &ServerEvent::timer_update(&self.poll_id, remaining),
                )
                .await;
            drop(poll);

            if remaining == 0 {
                break;
            }
            remaining -= 1;
        }

        self.finish().await;
        self.release().await;
    }

    async fn finish(&self) {
        match self.lifecycle.end_poll(&self.poll_id, EndCause::Timeout).await {
            Ok(poll) => {
                self.broadcaster
                    .to_session(&self.session_id, &ServerEvent::poll_ended(&poll))
                    .await;
            }
            Err(UseCaseError::Poll(PollError::AlreadyEnded)) => {
                tracing::debug!(poll_id = %self.poll_id, "Poll already ended before timeout");
            }
            Err(e) => {
                tracing::error!(poll_id = %self.poll_id, "Failed to end poll on timeout: {}", e);
            }
        }
    }

    /// 自分のハンドルだけを外す（置き換え後の新しいタイマーは残す）
    async fn release(&self) {
        let mut handles = self.handles.lock().await;
        if handles
            .get(&self.poll_id)
            .is_some_and(|h| h.generation == self.generation)
        {
            handles.remove(&self.poll_id);
        }
    }
}
