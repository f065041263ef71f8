//! Feed wire types.
//!
//! This module defines the messages exchanged with the strike feed and the
//! geocoding service.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`SUBSCRIBE_PAYLOAD`] | Local → Feed | Subscribe once after connecting |
//! | [`Strike`] | Feed → Local | One detected strike (compressed text frame) |
//! | [`GeocodeResponse`] | Geocoder → Local | Reverse geocoding result |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `strike` | Strike and station signal records |
//! | `address` | Reverse geocoding address and location label |

// ============================================================================
// Submodules
// ============================================================================

/// Reverse geocoding response types.
pub mod address;

/// Strike record types.
pub mod strike;

// ============================================================================
// Constants
// ============================================================================

/// Subscribe message sent once right after the connection opens.
pub const SUBSCRIBE_PAYLOAD: &str = r#"{"a":111}"#;

// ============================================================================
// Re-exports
// ============================================================================

pub use address::{Address, GeocodeResponse, UNKNOWN_LOCATION};
pub use strike::{Polarity, Signal, Strike, StrikeStatus};
