//! Error types for the strike monitor.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use strike_monitor::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     session.connect().await?;
//!     session.send(r#"{"a":111}"#).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Session (fatal) | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::NotConnected`], [`Error::InvalidState`], [`Error::Write`], [`Error::UnexpectedClose`], [`Error::WebSocket`] |
//! | Message (non-fatal) | [`Error::EmptyReference`], [`Error::Json`], [`Error::Geocoding`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::SessionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when monitor configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when DNS, TCP, TLS or the HTTP upgrade fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Handshake did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Operation requires an open session.
    #[error("Session not connected (state: {state})")]
    NotConnected {
        /// State the session was in.
        state: SessionState,
    },

    /// Operation is not allowed in the current session state.
    #[error("Invalid session state for {operation}: {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the session was in.
        state: SessionState,
    },

    /// Writing a frame failed.
    #[error("Write failed: {message}")]
    Write {
        /// Description of the write failure.
        message: String,
    },

    /// Remote closed the connection with a code that is not an expected termination.
    #[error("Unexpected close: code={code}, reason={reason:?}")]
    UnexpectedClose {
        /// Close code, `1006` when the stream ended without a close frame.
        code: u16,
        /// Close reason sent by the remote, if any.
        reason: String,
    },

    // ========================================================================
    // Message Errors
    // ========================================================================
    /// Self-referencing code with an empty previous entry.
    ///
    /// Returned by the decoder on corrupt frames.
    #[error("Invalid LZW data: empty previous entry at symbol {position}")]
    EmptyReference {
        /// Index of the offending symbol in the frame.
        position: usize,
    },

    /// Reverse geocoding failed.
    #[error("Geocoding error: {message}")]
    Geocoding {
        /// Description of the lookup failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: SessionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates a write error.
    #[inline]
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Creates an unexpected close error.
    #[inline]
    pub fn unexpected_close(code: u16, reason: impl Into<String>) -> Self {
        Self::UnexpectedClose {
            code,
            reason: reason.into(),
        }
    }

    /// Creates an empty reference error.
    #[inline]
    pub fn empty_reference(position: usize) -> Self {
        Self::EmptyReference { position }
    }

    /// Creates a geocoding error.
    #[inline]
    pub fn geocoding(message: impl Into<String>) -> Self {
        Self::Geocoding {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::NotConnected { .. }
                | Self::UnexpectedClose { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error ends the session.
    ///
    /// Non-fatal errors only affect the current message.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::EmptyReference { .. } | Self::Json(_) | Self::Geocoding { .. } | Self::Http(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
