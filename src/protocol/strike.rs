//! Strike record types.
//!
//! A decoded feed frame is one JSON object describing a located strike and
//! the stations that detected it.
//!
//! # Format
//!
//! ```json
//! {
//!   "time": 1718000000123456789,
//!   "lat": 45.1234, "lon": 7.5678, "alt": 0,
//!   "pol": 0, "mds": 9857, "mcg": 210, "status": 1, "region": 1,
//!   "delay": 3.2, "latc": 4, "lonc": 5,
//!   "sig": [{ "sta": 1234, "time": 4567, "lat": 45.0, "lon": 7.0, "alt": 230, "status": 15 }]
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Signal
// ============================================================================

/// Detection of a strike by one station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    /// Station identifier.
    pub sta: i64,

    /// Station latitude.
    pub lat: f64,

    /// Station longitude.
    pub lon: f64,

    /// Station altitude in meters.
    pub alt: i64,

    /// Signal status reported by the station.
    pub status: i64,

    /// Arrival offset relative to the strike time.
    pub time: i64,
}

// ============================================================================
// Strike
// ============================================================================

/// One located lightning strike.
///
/// Missing fields deserialize to zero, as the feed omits some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strike {
    /// Strike timestamp in nanoseconds since the Unix epoch.
    pub time: i64,

    /// Strike latitude.
    pub lat: f64,

    /// Strike longitude.
    pub lon: f64,

    /// Strike altitude in meters.
    pub alt: i64,

    /// Polarity (0 = negative, anything else positive).
    pub pol: i64,

    /// Maximum distance to the stations used for location, in meters.
    pub mds: i64,

    /// Localization quality.
    pub mcg: i64,

    /// Overall localization status.
    pub status: i64,

    /// Region identifier.
    pub region: i64,

    /// Processing delay in seconds.
    pub delay: f64,

    /// Latitude correction factor.
    pub latc: i64,

    /// Longitude correction factor.
    pub lonc: i64,

    /// Station signals, in feed order.
    pub sig: Vec<Signal>,
}

impl Strike {
    /// Parses a strike from decoded frame bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the payload is not a strike object.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Returns the strike polarity.
    #[inline]
    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        if self.pol == 0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    /// Returns the localization status band.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> StrikeStatus {
        StrikeStatus::from_code(self.status)
    }

    /// Returns the strike time as a UTC timestamp.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.time)
    }
}

// ============================================================================
// Polarity
// ============================================================================

/// Strike polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Negative discharge.
    Negative,
    /// Positive discharge.
    Positive,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => f.write_str("Negative"),
            Self::Positive => f.write_str("Positive"),
        }
    }
}

// ============================================================================
// StrikeStatus
// ============================================================================

/// Localization status band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeStatus {
    /// Code 0.
    VeryGood,
    /// Code 1.
    Good,
    /// Code 2.
    Questionable,
    /// Code 3.
    Poor,
    /// Any other code.
    Terrible,
}

impl StrikeStatus {
    /// Maps a raw status code to its band.
    #[inline]
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::VeryGood,
            1 => Self::Good,
            2 => Self::Questionable,
            3 => Self::Poor,
            _ => Self::Terrible,
        }
    }
}

impl fmt::Display for StrikeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::VeryGood => "Very good",
            Self::Good => "Good",
            Self::Questionable => "Questionable",
            Self::Poor => "Poor",
            Self::Terrible => "Terrible",
        };
        f.write_str(text)
    }
}

// ============================================================================
// Tests
// ============================================================================
