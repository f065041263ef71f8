//! WebSocket transport layer.
//!
//! This module owns the connection to the strike feed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                         ┌─────────────────┐
//! │  Session (Rust)      │        WebSocket        │  Strike feed    │
//! │                      │◄───────────────────────►│                 │
//! │  writer (send/close) │      wss://host/        │                 │
//! │  read task → frames  │                         │                 │
//! └──────────────────────┘                         └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Session::new` - Disconnected
//! 2. `Session::connect` - Connecting, then Open (or back to Disconnected)
//! 3. `Session::send` - Subscribe payload
//! 4. `Session::frames` - Spawn the read task, receive frames lazily
//! 5. `Session::close` - Closing, then Closed; unblocks the read task
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `session` | Session state machine, send and close |
//! | `frames` | Read task and close classification |

// ============================================================================
// Submodules
// ============================================================================

/// Read task and frame stream.
pub mod frames;

/// WebSocket session to the feed.
pub mod session;

/// In-process feed server for tests.
#[cfg(test)]
pub(crate) mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use frames::{Frame, FrameStream, classify_close};
pub use session::{Session, SessionState};
