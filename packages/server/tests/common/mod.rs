//! In-process test server and WebSocket peer helpers.

#![allow(dead_code)]

use std::{collections::VecDeque, net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{
    config::HubConfig,
    domain::{HubSnapshot, MessageBroker},
    infrastructure::hub::{Hub, HubHandle},
    ui::{AppState, Server},
};
use hiroba_shared::protocol::{CONNECTION_ID_HEADER, FRAME_SEPARATOR};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Hub and HTTP server bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: HubHandle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(HubConfig::default()).await
    }

    pub async fn start_with(config: HubConfig) -> Self {
        config.validate().expect("test config should be valid");

        let (hub, handle) = Hub::new(config.clone());
        tokio::spawn(hub.run());

        let broker: Arc<dyn MessageBroker> = Arc::new(handle.clone());
        let server = Server::new(AppState::new(broker, config.pump_settings()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            handle,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn ws_url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("ws://{}/ws", self.addr)
        } else {
            format!("ws://{}/ws?{}", self.addr, query)
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn snapshot(&self) -> HubSnapshot {
        self.handle.snapshot().await.expect("hub should be running")
    }

    /// Poll the hub until `condition` holds.
    pub async fn wait_until(&self, condition: impl Fn(&HubSnapshot) -> bool) -> HubSnapshot {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let snapshot = self.snapshot().await;
            if condition(&snapshot) {
                return snapshot;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "hub never reached the expected state: {snapshot:?}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Trigger the same shutdown path as a signal.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A WebSocket peer connected to the test server
pub struct Peer {
    pub id: String,
    ws: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    /// Payloads of coalesced frames not consumed yet
    pending: VecDeque<String>,
}

impl Peer {
    /// Connect with the given query string (`name=alice&client_id=...`).
    pub async fn connect(server: &TestServer, query: &str) -> Self {
        Self::try_connect(server, query)
            .await
            .expect("WebSocket handshake should succeed")
    }

    pub async fn try_connect(server: &TestServer, query: &str) -> Result<Self, tungstenite::Error> {
        let (ws, response) = connect_async(server.ws_url(query)).await?;
        let id = response
            .headers()
            .get(CONNECTION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("upgrade response should carry the connection id")
            .to_string();
        Ok(Self {
            id,
            ws,
            pending: VecDeque::new(),
        })
    }

    pub async fn send(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next payload, splitting coalesced frames. `None` on close or timeout.
    pub async fn recv(&mut self) -> Option<String> {
        self.recv_within(RECV_TIMEOUT).await
    }

    pub async fn recv_within(&mut self, wait: Duration) -> Option<String> {
        if let Some(payload) = self.pending.pop_front() {
            return Some(payload);
        }
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let next = tokio::time::timeout_at(deadline, self.ws.next()).await.ok()??;
            match next.ok()? {
                Message::Text(text) => {
                    self.pending
                        .extend(text.as_str().split(FRAME_SEPARATOR).map(str::to_string));
                    return self.pending.pop_front();
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Collect `count` payloads, panicking if they do not arrive.
    pub async fn recv_n(&mut self, count: usize) -> Vec<String> {
        let mut received = Vec::with_capacity(count);
        for _ in 0..count {
            match self.recv().await {
                Some(payload) => received.push(payload),
                None => panic!("expected {count} payloads, got {received:?}"),
            }
        }
        received
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let unexpected = self.recv_within(Duration::from_millis(200)).await;
        assert_eq!(unexpected, None, "peer '{}' received a message", self.id);
    }

    /// Join a room and wait for the confirmation.
    pub async fn join(&mut self, room: &str) {
        self.send(&format!("join_room:{room}")).await;
        assert_eq!(
            self.recv().await,
            Some(format!("join_room_success:{room}"))
        );
    }

    /// Send a Close frame and wait for the server to finish the handshake.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        while let Some(Ok(_)) = self.ws.next().await {}
    }

    /// Drop the TCP connection without a Close frame.
    pub fn drop_transport(self) {
        drop(self.ws);
    }
}
