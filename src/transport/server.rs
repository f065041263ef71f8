//! In-process WebSocket feed for tests.
//!
//! # Connection Flow
//!
//! 1. `FeedServer::bind` - Bind to `127.0.0.1:0` (random port)
//! 2. Point a [`crate::Session`] at `FeedServer::ws_url`
//! 3. `serve_*` - Accept one client and run a scripted exchange

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::debug;

// ============================================================================
// FeedServer
// ============================================================================

/// A feed server that is bound but not yet connected.
pub(crate) struct FeedServer {
    /// TCP listener for the client connection.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl FeedServer {
    /// Binds to a random localhost port.
    pub(crate) async fn bind() -> Self {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await.expect("bind feed server");
        let port = listener.local_addr().expect("local addr").port();

        debug!(port, "Feed server bound");

        Self { listener, port }
    }

    /// Returns a URL nothing listens on.
    pub(crate) async fn unused_url() -> String {
        let server = Self::bind().await;
        let url = server.ws_url();
        drop(server);
        url
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    pub(crate) fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Accepts the client and completes the upgrade.
    async fn accept(self) -> WebSocketStream<TcpStream> {
        let (stream, addr) = self.listener.accept().await.expect("accept client");
        debug!(?addr, "TCP connection accepted");

        tokio_tungstenite::accept_async(stream)
            .await
            .expect("WebSocket upgrade")
    }

    /// Sends `frames` as text messages, then closes with `close` if given.
    ///
    /// Every text message from the client is forwarded to the returned
    /// receiver. The task ends when the client goes away.
    pub(crate) fn serve_recording(
        self,
        frames: Vec<String>,
        close: Option<CloseCode>,
    ) -> (JoinHandle<()>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut ws = self.accept().await;

            for frame in frames {
                if ws.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }

            if let Some(code) = close {
                let frame = CloseFrame {
                    code,
                    reason: "".into(),
                };
                let _ = ws.send(Message::Close(Some(frame))).await;
            }

            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    let _ = tx.send(text.as_str().to_owned());
                }
            }
        });

        (task, rx)
    }

    /// Waits for the first client message, then sends `frames` and closes
    /// normally.
    pub(crate) fn serve_after_subscribe(self, frames: Vec<Vec<u8>>) -> JoinHandle<Option<String>> {
        tokio::spawn(async move {
            let mut ws = self.accept().await;

            let subscribe = match ws.next().await {
                Some(Ok(Message::Text(text))) => Some(text.as_str().to_owned()),
                _ => None,
            };

            for frame in frames {
                let text = String::from_utf8(frame).expect("text frame");
                if ws.send(Message::Text(text.into())).await.is_err() {
                    return subscribe;
                }
            }

            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            };
            let _ = ws.send(Message::Close(Some(frame))).await;
            while let Some(Ok(_)) = ws.next().await {}

            subscribe
        })
    }

    /// Accepts the client and never sends or reads anything.
    pub(crate) fn serve_silent(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let _ws = self.accept().await;
            std::future::pending::<()>().await;
        })
    }

    /// Accepts the client and drops the connection without a close frame.
    pub(crate) fn serve_drop(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let ws = self.accept().await;
            drop(ws);
        })
    }
}
