//! Test fixtures for integration tests.
//!
//! Starts the server in-process on an ephemeral port and provides a small
//! WebSocket client. The server shuts down when `TestServer` is dropped.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use kyoshitsu_server::ServerConfig;
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: std::net::SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start with the default 1 second countdown tick.
    pub async fn start() -> Self {
        Self::start_with_tick(1000).await
    }

    /// Start with a custom countdown tick (milliseconds per countdown second).
    pub async fn start_with_tick(tick_interval_ms: u64) -> Self {
        Self::start_with(ServerConfig {
            tick_interval_ms,
            ..ServerConfig::default()
        })
        .await
    }

    /// Start with `config`; the port is always an ephemeral one.
    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let config = ServerConfig {
            port: addr.port(),
            ..config
        };

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = kyoshitsu_server::serve(listener, config, shutdown).await {
                eprintln!("Test server error: {e}");
            }
        });

        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn client(&self) -> WsClient {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        WsClient { stream }
    }

    /// Connect and join `session_id`, consuming the `joined` event.
    pub async fn join(&self, session_id: &str, role: &str, name: Option<&str>) -> WsClient {
        let mut client = self.client().await;
        client
            .send(
                "join",
                json!({"sessionId": session_id, "role": role, "studentName": name}),
            )
            .await;
        client.expect("joined").await;
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn send(&mut self, event: &str, data: Value) {
        self.send_raw(&json!({"event": event, "data": data}).to_string())
            .await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next JSON event frame.
    pub async fn recv(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    }

    /// Skip frames until `event` arrives and return its data.
    pub async fn expect(&mut self, event: &str) -> Value {
        loop {
            let frame = self.recv().await;
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }

    /// Skip frames until an `event` whose data satisfies `pred` arrives.
    pub async fn expect_matching(&mut self, event: &str, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let data = self.expect(event).await;
            if pred(&data) {
                return data;
            }
        }
    }

    /// Collect every frame until `event` arrives (inclusive).
    pub async fn collect_until(&mut self, event: &str) -> Vec<Value> {
        let mut frames = Vec::new();
        loop {
            let frame = self.recv().await;
            let done = frame["event"] == event;
            frames.push(frame);
            if done {
                return frames;
            }
        }
    }

    /// `None` when nothing arrives within `window`.
    pub async fn recv_within(&mut self, window: Duration) -> Option<Value> {
        tokio::time::timeout(window, self.recv()).await.ok()
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
