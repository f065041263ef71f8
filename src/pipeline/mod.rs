//! Strike processing pipeline.
//!
//! # Architecture
//!
//! ```text
//! frame ──► codec::decode ──► Strike::from_slice ──► Geocoder ──► Emitter
//!           (drop on error)   (drop on error)        (paced)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `monitor` | Run loop, per-frame pipeline, shutdown |
//! | `display` | Emitter trait and console report |

// ============================================================================
// Submodules
// ============================================================================

/// Strike output.
pub mod display;

/// Run loop and shutdown coordination.
pub mod monitor;

// ============================================================================
// Re-exports
// ============================================================================

pub use display::{ConsoleEmitter, Emitter, render_report};
pub use monitor::Monitor;
