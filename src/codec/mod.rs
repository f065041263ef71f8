//! Frame decompression.
//!
//! Inbound feed frames are compressed with an adaptive-dictionary scheme
//! (LZW family). The upstream encoder never caps its code width and never
//! resets its dictionary, so the decoder here does neither.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `lzw` | Dictionary and decoder state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Append-only dictionary decoder.
pub mod lzw;

// ============================================================================
// Re-exports
// ============================================================================

pub use lzw::{Dictionary, Symbol, decode, decode_symbols, symbols};
