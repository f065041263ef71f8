//! WebSocket session to the strike feed.
//!
//! A [`Session`] owns one connection and its [`SessionState`]:
//!
//! ```text
//! Disconnected ──connect──► Connecting ──ok──► Open
//!      ▲                        │
//!      └────────failure─────────┘
//!
//! any state ──close──► Closing ──► Closed
//! ```
//!
//! The read half moves into the read task on [`Session::frames`]; the write
//! half stays in the session for [`Session::send`] and [`Session::close`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};

use super::frames::FrameStream;

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket over plain TCP or TLS.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the connection.
type WsSink = SplitSink<WsStream, Message>;

/// Read half of the connection.
pub(crate) type WsSource = SplitStream<WsStream>;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not connected; initial state and the state after a failed connect.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected; frames can be sent and received.
    Open,
    /// Close in progress.
    Closing,
    /// Closed for good.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(text)
    }
}

// ============================================================================
// Session
// ============================================================================

/// WebSocket session to the strike feed.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync`. [`Session::close`] may run while the read task
/// is blocked in a read; the read is interrupted and the frame stream ends.
pub struct Session {
    /// Immutable settings.
    config: MonitorConfig,
    /// Lifecycle state.
    state: Mutex<SessionState>,
    /// Write half, `None` unless connected.
    writer: tokio::sync::Mutex<Option<WsSink>>,
    /// Read half until the read task takes it.
    reader: Mutex<Option<WsSource>>,
    /// Fired by `close` to stop the read task.
    closed: CancellationToken,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SessionState::Disconnected),
            writer: tokio::sync::Mutex::new(None),
            reader: Mutex::new(None),
            closed: CancellationToken::new(),
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Returns `true` if the session is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Returns the session configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Connects to the configured feed URL.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the session is not disconnected
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds the handshake timeout
    /// - [`Error::Connection`] if DNS, TCP, TLS or the upgrade fails
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != SessionState::Disconnected {
                return Err(Error::invalid_state("connect", *state));
            }
            *state = SessionState::Connecting;
        }

        let url = self.config.url.as_str();
        info!(%url, "Connecting to feed");

        let handshake_timeout = self.config.handshake_timeout;
        let ws_stream = match timeout(handshake_timeout, connect_async(url)).await {
            Ok(Ok((ws_stream, response))) => {
                debug!(status = %response.status(), "WebSocket handshake completed");
                ws_stream
            }
            Ok(Err(e)) => {
                self.fail_connect();
                return Err(Error::connection(format!("failed to connect to {url}: {e}")));
            }
            Err(_) => {
                self.fail_connect();
                return Err(Error::connection_timeout(handshake_timeout.as_millis() as u64));
            }
        };

        let (sink, source) = ws_stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock() = Some(source);

        let opened = {
            let mut state = self.state.lock();
            if *state == SessionState::Connecting {
                *state = SessionState::Open;
                true
            } else {
                false
            }
        };

        if !opened {
            // Closed while the handshake was in flight.
            self.release().await;
            return Err(Error::connection("session closed during handshake"));
        }

        info!(%url, "Connection established");
        Ok(())
    }

    /// Sends a text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the session is not open
    /// - [`Error::Write`] if the transport fails or the write timeout elapses
    pub async fn send(&self, payload: &str) -> Result<()> {
        let state = self.state();
        if state != SessionState::Open {
            return Err(Error::not_connected(state));
        }

        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(Error::not_connected(self.state()));
        };

        let write_timeout = self.config.write_timeout;
        let message = Message::Text(payload.to_owned().into());

        match timeout(write_timeout, sink.send(message)).await {
            Ok(Ok(())) => {
                debug!(len = payload.len(), "Message sent");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::write(e.to_string())),
            Err(_) => Err(Error::write(format!(
                "timed out after {}ms",
                write_timeout.as_millis()
            ))),
        }
    }

    /// Starts the read task and returns the frame stream.
    ///
    /// The task checks `token` before every read and waits at most
    /// `read_timeout` per read, so it stops within `read_timeout` of a
    /// cancellation request.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the session is not open
    /// - [`Error::InvalidState`] if the read task was already started
    pub fn frames(&self, token: CancellationToken, read_timeout: Duration) -> Result<FrameStream> {
        let state = self.state();
        if state != SessionState::Open {
            return Err(Error::not_connected(state));
        }

        let source = self
            .reader
            .lock()
            .take()
            .ok_or_else(|| Error::invalid_state("frames", state))?;

        debug!(
            read_timeout_ms = read_timeout.as_millis() as u64,
            "Starting read task"
        );

        Ok(FrameStream::spawn(
            source,
            token,
            self.closed.clone(),
            read_timeout,
            self.config.frame_buffer,
        ))
    }

    /// Closes the session.
    ///
    /// Sends a close frame (failures are logged, not returned), stops the
    /// read task and releases the connection. Safe to call any number of
    /// times, from any state.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                SessionState::Closing | SessionState::Closed => return,
                _ => *state = SessionState::Closing,
            }
        }

        self.release().await;

        *self.state.lock() = SessionState::Closed;
        debug!("Session closed");
    }

    /// Sends the close frame, stops the read task and drops both halves.
    async fn release(&self) {
        let sink = self.writer.lock().await.take();

        if let Some(mut sink) = sink {
            let close = Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            }));
            let write_timeout = self.config.write_timeout;

            match timeout(write_timeout, sink.send(close)).await {
                Ok(Ok(())) => debug!("Close frame sent"),
                Ok(Err(e)) => warn!(error = %e, "Error sending close message"),
                Err(_) => warn!(
                    timeout_ms = write_timeout.as_millis() as u64,
                    "Timed out sending close message"
                ),
            }
        }

        self.closed.cancel();
        drop(self.reader.lock().take());
    }

    /// Returns a failed handshake to `Disconnected`.
    fn fail_connect(&self) {
        let mut state = self.state.lock();
        if *state == SessionState::Connecting {
            *state = SessionState::Disconnected;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
