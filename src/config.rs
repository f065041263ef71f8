//! Monitor configuration.
//!
//! [`MonitorConfig`] is an immutable value handed to [`crate::Session`] and
//! [`crate::Monitor`] at construction.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use strike_monitor::MonitorConfig;
//!
//! let config = MonitorConfig::new()
//!     .with_url("wss://ws7.blitzortung.org/")
//!     .with_read_timeout(Duration::from_secs(5))
//!     .without_geocoding();
//!
//! assert!(config.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default feed endpoint.
pub const DEFAULT_FEED_URL: &str = "wss://ws1.blitzortung.org/";

/// Default reverse geocoding endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Default timeout for the WebSocket handshake, reads and writes.
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between geocoding requests (Nominatim usage policy).
const DEFAULT_LOOKUP_INTERVAL: Duration = Duration::from_secs(1);

/// Time the read task gets to stop after an interrupt.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Frames buffered between the read task and the pipeline.
const DEFAULT_FRAME_BUFFER: usize = 16;

// ============================================================================
// MonitorConfig
// ============================================================================

/// Connection, timing and enrichment settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Feed WebSocket URL (`ws://` or `wss://`).
    pub url: String,

    /// Maximum time for the WebSocket handshake.
    pub handshake_timeout: Duration,

    /// Maximum time a single read waits; bounds cancellation latency.
    pub read_timeout: Duration,

    /// Maximum time for a single write, including the close handshake.
    pub write_timeout: Duration,

    /// Reverse geocoding endpoint (`http://` or `https://`).
    pub geocoder_url: String,

    /// Timeout for one geocoding request.
    pub http_timeout: Duration,

    /// Pause after every geocoding request.
    pub lookup_interval: Duration,

    /// Time the read task gets to stop after a stop request.
    pub shutdown_grace: Duration,

    /// Whether strikes are enriched with a location label.
    pub geocoding: bool,

    /// Frames buffered between the read task and the pipeline.
    pub frame_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl MonitorConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            handshake_timeout: DEFAULT_IO_TIMEOUT,
            read_timeout: DEFAULT_IO_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            http_timeout: DEFAULT_IO_TIMEOUT,
            lookup_interval: DEFAULT_LOOKUP_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            geocoding: true,
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl MonitorConfig {
    /// Sets the feed URL.
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[inline]
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[inline]
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the reverse geocoding endpoint.
    #[inline]
    #[must_use]
    pub fn with_geocoder_url(mut self, url: impl Into<String>) -> Self {
        self.geocoder_url = url.into();
        self
    }

    /// Sets the geocoding request timeout.
    #[inline]
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Sets the pause after each geocoding request.
    #[inline]
    #[must_use]
    pub fn with_lookup_interval(mut self, interval: Duration) -> Self {
        self.lookup_interval = interval;
        self
    }

    /// Sets the shutdown grace window.
    #[inline]
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Disables location enrichment.
    #[inline]
    #[must_use]
    pub fn without_geocoding(mut self) -> Self {
        self.geocoding = false;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl MonitorConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a URL does not parse or has the wrong
    /// scheme, or if a timeout or the frame buffer is zero.
    pub fn validate(&self) -> Result<()> {
        check_url(&self.url, &["ws", "wss"], "feed URL")?;

        if self.geocoding {
            check_url(&self.geocoder_url, &["http", "https"], "geocoder URL")?;
        }

        let timeouts = [
            ("handshake timeout", self.handshake_timeout),
            ("read timeout", self.read_timeout),
            ("write timeout", self.write_timeout),
            ("HTTP timeout", self.http_timeout),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| value.is_zero()) {
            return Err(Error::config(format!("{name} must be greater than zero")));
        }

        if self.frame_buffer == 0 {
            return Err(Error::config("frame buffer must be greater than zero"));
        }

        Ok(())
    }
}

/// Parses `value` and checks its scheme.
fn check_url(value: &str, schemes: &[&str], name: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| Error::config(format!("invalid {name} '{value}': {e}")))?;

    if !schemes.contains(&url.scheme()) {
        return Err(Error::config(format!(
            "{name} must use one of {schemes:?}, got '{}'",
            url.scheme()
        )));
    }

    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
