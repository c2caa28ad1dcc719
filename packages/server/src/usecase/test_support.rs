//! Shared fixtures for use case tests.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, Role, SessionId},
    infrastructure::{
        Broadcaster, SessionRegistry,
        repository::{InMemoryChatRepository, InMemoryPollRepository},
    },
};

use super::{PollLifecycle, PollTimer};

pub(crate) struct Harness {
    pub registry: Arc<SessionRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    pub poll_store: Arc<InMemoryPollRepository>,
    pub chat_store: Arc<InMemoryChatRepository>,
    pub lifecycle: Arc<PollLifecycle>,
    pub timer: Arc<PollTimer>,
}

pub(crate) struct Client {
    pub id: ConnectionId,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl Client {
    /// Every frame received so far, parsed
    pub fn drain(&mut self) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    /// Names of every event received so far
    pub fn drain_events(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|f| f["event"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Harness {
    pub fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
        let poll_store = Arc::new(InMemoryPollRepository::new());
        let chat_store = Arc::new(InMemoryChatRepository::new());
        let lifecycle = Arc::new(PollLifecycle::new(poll_store.clone()));
        let timer = Arc::new(PollTimer::new(
            lifecycle.clone(),
            broadcaster.clone(),
            Duration::from_secs(1),
        ));
        Self {
            registry,
            broadcaster,
            poll_store,
            chat_store,
            lifecycle,
            timer,
        }
    }

    pub async fn connect(&self) -> Client {
        let id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.connect(id.clone(), tx).await;
        Client { id, rx }
    }

    /// Connect and join directly through the registry (no replay)
    pub async fn joined(&self, session: &str, role: Role, name: Option<&str>) -> Client {
        let client = self.connect().await;
        self.registry
            .join(&client.id, &session_id(session), role, name)
            .await
            .unwrap();
        client
    }
}

pub(crate) fn session_id(raw: &str) -> SessionId {
    SessionId::new(raw.to_string()).unwrap()
}
