//! Server state shared by all handlers.

use std::sync::Arc;

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{
    config::ServerConfig,
    domain::{ChatRepository, PollRepository},
    infrastructure::{
        Broadcaster, SessionRegistry,
        repository::{InMemoryChatRepository, InMemoryPollRepository},
    },
    usecase::{PollLifecycle, PollTimer},
};

/// Shared application state
pub struct AppState {
    /// 接続とセッションの管理
    pub registry: Arc<SessionRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    pub lifecycle: Arc<PollLifecycle>,
    pub timer: Arc<PollTimer>,
    /// Repository（データアクセス層の抽象化）
    pub poll_store: Arc<dyn PollRepository>,
    pub chat_store: Arc<dyn ChatRepository>,
    pub chat_retention_days: u32,
    /// HTTP API の CORS 許可オリジン。空ならすべて許可
    pub cors_origins: Vec<String>,
    /// バックグラウンドタスクへの停止通知
    stop: watch::Sender<bool>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl AppState {
    /// インメモリのストアで状態を組み立てる
    pub fn new(config: &ServerConfig) -> Arc<Self> {
        Self::with_stores(
            config,
            Arc::new(InMemoryPollRepository::new()),
            Arc::new(InMemoryChatRepository::new()),
        )
    }

    pub fn with_stores(
        config: &ServerConfig,
        poll_store: Arc<dyn PollRepository>,
        chat_store: Arc<dyn ChatRepository>,
    ) -> Arc<Self> {
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
        let lifecycle = Arc::new(PollLifecycle::new(poll_store.clone()));
        let timer = Arc::new(PollTimer::new(
            lifecycle.clone(),
            broadcaster.clone(),
            config.tick_interval(),
        ));
        let (stop, _) = watch::channel(false);

        Arc::new(Self {
            registry,
            broadcaster,
            lifecycle,
            timer,
            poll_store,
            chat_store,
            chat_retention_days: config.chat_retention_days,
            cors_origins: config.cors_origins.clone(),
            stop,
            background: Mutex::new(Vec::new()),
        })
    }

    /// 停止通知の受信側
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }

    /// `shutdown` で停止を待つタスクとして登録する
    pub async fn track(&self, handle: JoinHandle<()>) {
        self.background.lock().await.push(handle);
    }

    /// タイマーとバックグラウンドタスクを止め、終了を待つ
    pub async fn shutdown(&self) {
        let _ = self.stop.send(true);
        let handles: Vec<_> = self.background.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }
        self.timer.shutdown().await;
        tracing::info!("Application state shut down");
    }
}
