//! Location enrichment.
//!
//! The pipeline asks a [`Geocoder`] for the address at each strike's
//! coordinates. Lookups are strictly sequential and the pipeline pauses after
//! each one, which keeps the request rate within the service's usage policy.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `nominatim` | HTTP client for Nominatim-compatible reverse geocoding |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Address;

// ============================================================================
// Submodules
// ============================================================================

/// Nominatim reverse geocoding client.
pub mod nominatim;

// ============================================================================
// Re-exports
// ============================================================================

pub use nominatim::NominatimClient;

// ============================================================================
// Geocoder
// ============================================================================

/// Reverse geocoding service.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns the address at the given coordinates.
    ///
    /// # Errors
    ///
    /// Any error; the pipeline falls back to the unknown location.
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Address>;
}
