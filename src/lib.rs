//! Strike Monitor - real-time lightning strike feed client.
//!
//! This library connects to a public lightning-detection WebSocket feed,
//! decodes its compressed frames into strike records, optionally resolves a
//! human-readable location for each strike and reports it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  frames   ┌─────────┐  bytes  ┌──────────┐  Strike  ┌──────────┐
//! │ Session     │──────────►│ codec   │────────►│ protocol │─────────►│ Geocoder │
//! │ (WebSocket) │           │ (LZW)   │         │ (JSON)   │          │ (paced)  │
//! └─────────────┘           └─────────┘         └──────────┘          └────┬─────┘
//!        ▲                                                                 │
//!        │ connect / subscribe / close                                     ▼
//! ┌──────┴──────┐                                                    ┌──────────┐
//! │ Monitor     │───────────────────────────────────────────────────►│ Emitter  │
//! └─────────────┘                                                    └──────────┘
//! ```
//!
//! Key design principles:
//!
//! - One connection per [`Session`], never reused after close
//! - Frames are processed strictly in arrival order
//! - Bad frames and failed lookups never end the session
//! - Shutdown waits for the read task up to a bounded grace window
//!
//! # Quick Start
//!
//! ```no_run
//! use strike_monitor::{Monitor, MonitorConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let monitor = Monitor::new(MonitorConfig::new())?;
//!
//!     monitor
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`codec`] | Frame decompression |
//! | [`config`] | [`MonitorConfig`] and defaults |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`geocoding`] | Reverse geocoding: [`Geocoder`], [`NominatimClient`] |
//! | [`pipeline`] | [`Monitor`] run loop and [`Emitter`] output |
//! | [`protocol`] | Strike and address records |
//! | [`transport`] | WebSocket [`Session`] and [`FrameStream`] |

// ============================================================================
// Modules
// ============================================================================

/// Frame decompression.
///
/// Feed frames are LZW-style compressed; [`codec::decode`] restores the JSON.
pub mod codec;

/// Monitor configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Reverse geocoding.
pub mod geocoding;

/// Strike processing pipeline.
///
/// Use [`Monitor::run`] to drive the feed until it ends or a stop is requested.
pub mod pipeline;

/// Feed message types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::MonitorConfig;

// Error types
pub use error::{Error, Result};

// Geocoding
pub use geocoding::{Geocoder, NominatimClient};

// Pipeline
pub use pipeline::{ConsoleEmitter, Emitter, Monitor, render_report};

// Protocol types
pub use protocol::{Address, Polarity, Signal, Strike, StrikeStatus, UNKNOWN_LOCATION};

// Transport
pub use transport::{FrameStream, Session, SessionState};
