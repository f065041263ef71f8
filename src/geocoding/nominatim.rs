//! Nominatim reverse geocoding client.
//!
//! Issues `GET {endpoint}?format=json&lat=..&lon=..&zoom=18&addressdetails=1`
//! and returns the `address` block of the response.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::protocol::{Address, GeocodeResponse};

use super::Geocoder;

// ============================================================================
// Constants
// ============================================================================

/// User agent sent with every request (required by the Nominatim policy).
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Detail level of the reverse lookup (18 = building).
const ZOOM: &str = "18";

// ============================================================================
// NominatimClient
// ============================================================================

/// HTTP client for a Nominatim-compatible `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    /// Shared HTTP client with the configured timeout.
    client: Client,
    /// Reverse endpoint URL.
    endpoint: String,
}

impl NominatimClient {
    /// Creates a client for the configured endpoint and HTTP timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.geocoder_url.clone(),
        })
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Address> {
        let lat = format!("{lat:.6}");
        let lon = format!("{lon:.6}");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", ZOOM),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::geocoding(format!("HTTP status {status}")));
        }

        let body: GeocodeResponse = response.json().await?;
        debug!(%lat, %lon, place_id = body.place_id, "Reverse geocoded");

        Ok(body.address)
    }
}

// ============================================================================
// Tests
// ============================================================================
