//! Read task and frame stream.
//!
//! [`crate::Session::frames`] spawns a tokio task that reads the WebSocket
//! and forwards every data message through a bounded channel. The task stops
//! when:
//!
//! - the caller's cancellation token fires (checked before every read, and
//!   while a read or a hand-off is pending),
//! - the session is closed locally,
//! - the remote closes the connection, or
//! - the transport fails.
//!
//! Every read is bounded by the read timeout. A timeout is an idle tick: the
//! task re-checks cancellation and reads again.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

use super::session::WsSource;

// ============================================================================
// Types
// ============================================================================

/// One raw message from the feed, before decompression.
pub type Frame = Vec<u8>;

// ============================================================================
// Close Classification
// ============================================================================

/// Decides whether a connection termination is expected.
///
/// Normal closure and going-away are expected. Abnormal closure (the stream
/// ended without a close frame) is expected only while the session is being
/// shut down locally. Every other code is an [`Error::UnexpectedClose`].
///
/// # Errors
///
/// Returns [`Error::UnexpectedClose`] for unexpected terminations.
pub fn classify_close(code: CloseCode, reason: &str, local_shutdown: bool) -> Result<()> {
    match code {
        CloseCode::Normal | CloseCode::Away => Ok(()),
        CloseCode::Abnormal if local_shutdown => Ok(()),
        other => Err(Error::unexpected_close(u16::from(other), reason)),
    }
}

// ============================================================================
// FrameStream
// ============================================================================

/// Lazy sequence of frames produced by the read task.
///
/// Items are `Ok(frame)` for data messages. The sequence ends with `None`
/// after a clean termination, or with a single `Err` item after a failure.
pub struct FrameStream {
    /// Frames handed over by the read task.
    rx: mpsc::Receiver<Result<Frame>>,
    /// The read task.
    handle: JoinHandle<()>,
}

impl FrameStream {
    /// Spawns the read task over `source`.
    pub(crate) fn spawn(
        source: WsSource,
        token: CancellationToken,
        closed: CancellationToken,
        read_timeout: Duration,
        buffer: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = tokio::spawn(Self::run_read_loop(source, tx, token, closed, read_timeout));

        Self { rx, handle }
    }

    /// Waits for the next frame.
    ///
    /// Returns `None` once the read task has ended and all frames were taken.
    pub async fn next(&mut self) -> Option<Result<Frame>> {
        self.rx.recv().await
    }

    /// Returns `true` if the read task has ended.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits up to `grace` for the read task to end.
    ///
    /// Frames not yet taken are discarded. Returns `false` on timeout; the
    /// task is left to stop on its own.
    pub async fn join(self, grace: Duration) -> bool {
        let Self { rx, handle } = self;
        drop(rx);

        match timeout(grace, handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Read task failed");
                true
            }
            Err(_) => false,
        }
    }

    /// Read task body.
    async fn run_read_loop(
        mut source: WsSource,
        tx: mpsc::Sender<Result<Frame>>,
        token: CancellationToken,
        closed: CancellationToken,
        read_timeout: Duration,
    ) {
        match Self::read_frames(&mut source, &tx, &token, &closed, read_timeout).await {
            Ok(()) => debug!("Frame stream ended"),
            Err(e) => {
                debug!(error = %e, "Frame stream failed");
                tokio::select! {
                    biased;
                    () = token.cancelled() => {}
                    _ = tx.send(Err(e)) => {}
                }
            }
        }

        debug!("Read task terminated");
    }

    /// Reads until cancellation, close or failure.
    async fn read_frames(
        source: &mut WsSource,
        tx: &mpsc::Sender<Result<Frame>>,
        token: &CancellationToken,
        closed: &CancellationToken,
        read_timeout: Duration,
    ) -> Result<()> {
        loop {
            if token.is_cancelled() {
                debug!("Frame stream cancelled");
                return Ok(());
            }

            let message = tokio::select! {
                biased;

                () = token.cancelled() => {
                    debug!("Frame stream cancelled during read");
                    return Ok(());
                }

                () = closed.cancelled() => {
                    debug!("Session closed during read");
                    return classify_close(CloseCode::Abnormal, "", true);
                }

                read = timeout(read_timeout, source.next()) => match read {
                    Ok(message) => message,
                    Err(_) => {
                        trace!(timeout_ms = read_timeout.as_millis() as u64, "Read idle");
                        continue;
                    }
                },
            };

            let local_shutdown = token.is_cancelled() || closed.is_cancelled();

            let frame = match message {
                Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),

                Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),

                Some(Ok(Message::Close(close_frame))) => {
                    let (code, reason) = close_frame
                        .map(|f| (f.code, f.reason.as_str().to_owned()))
                        .unwrap_or((CloseCode::Normal, String::new()));
                    debug!(code = u16::from(code), %reason, "WebSocket closed by remote");
                    return classify_close(code, &reason, local_shutdown);
                }

                // Ignore Ping, Pong, raw frames
                Some(Ok(_)) => continue,

                Some(Err(e)) => {
                    if local_shutdown {
                        debug!(error = %e, "Read failed during shutdown");
                        return Ok(());
                    }
                    return Err(Error::WebSocket(e));
                }

                None => {
                    debug!("WebSocket stream ended");
                    return classify_close(CloseCode::Abnormal, "stream ended", local_shutdown);
                }
            };

            trace!(len = frame.len(), "Frame received");

            tokio::select! {
                biased;

                () = token.cancelled() => return Ok(()),

                () = closed.cancelled() => return Ok(()),

                sent = tx.send(Ok(frame)) => {
                    if sent.is_err() {
                        debug!("Frame receiver dropped");
                        return Ok(());
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_closes() {
        assert!(classify_close(CloseCode::Normal, "", false).is_ok());
        assert!(classify_close(CloseCode::Away, "server restart", false).is_ok());
        assert!(classify_close(CloseCode::Abnormal, "", true).is_ok());
    }

    #[test]
    fn test_abnormal_without_shutdown() {
        let err = classify_close(CloseCode::Abnormal, "stream ended", false).unwrap_err();
        assert!(matches!(err, Error::UnexpectedClose { code: 1006, .. }));
    }

    #[test]
    fn test_unexpected_codes() {
        for code in [
            CloseCode::Protocol,
            CloseCode::Policy,
            CloseCode::Error,
            CloseCode::Again,
            CloseCode::Library(4000),
        ] {
            let err = classify_close(code, "bye", false).unwrap_err();
            assert!(err.is_fatal());
            assert!(matches!(err, Error::UnexpectedClose { .. }));
        }

        let err = classify_close(CloseCode::Error, "overloaded", true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected close: code=1011, reason=\"overloaded\""
        );
    }
}
