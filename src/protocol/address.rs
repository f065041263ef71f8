//! Reverse geocoding response types.
//!
//! Only the `address` block of a Nominatim-style response is used, to build
//! a short location label for each strike.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Location shown when no label is available.
pub const UNKNOWN_LOCATION: &str = "unknown";

// ============================================================================
// GeocodeResponse
// ============================================================================

/// Reverse geocoding response.
///
/// # Format
///
/// ```json
/// {
///   "place_id": 1234,
///   "display_name": "Via Roma, Torino, Piemonte, Italia",
///   "address": { "road": "Via Roma", "city": "Torino", "country": "Italia" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeResponse {
    /// Place identifier.
    pub place_id: i64,

    /// Data licence notice.
    pub licence: String,

    /// OSM object type.
    pub osm_type: String,

    /// OSM object identifier.
    pub osm_id: i64,

    /// Latitude of the matched place, as text.
    pub lat: String,

    /// Longitude of the matched place, as text.
    pub lon: String,

    /// Full human-readable name.
    pub display_name: String,

    /// Address breakdown.
    pub address: Address,
}

// ============================================================================
// Address
// ============================================================================

/// Address breakdown of a location.
///
/// Every field is optional in the response and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Street name.
    pub road: String,
    /// Village name.
    pub village: String,
    /// Town name.
    pub town: String,
    /// City name.
    pub city: String,
    /// Suburb or city district.
    pub suburb: String,
    /// Municipality; not part of the label.
    pub municipality: String,
    /// County or equivalent.
    pub county: String,
    /// State.
    pub state: String,
    /// Province.
    pub province: String,
    /// Region.
    pub region: String,
    /// Postal code; not part of the label.
    pub postcode: String,
    /// Country name.
    pub country: String,
    /// ISO 3166-1 alpha-2 code, lowercase; not part of the label.
    pub country_code: String,
}

impl Address {
    /// Builds a comma-separated location label.
    ///
    /// Parts, in order: road, the first settlement field (village, town,
    /// city, suburb), county, the first admin field (state, province,
    /// region), country. Returns `None` if every part is empty.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        let settlement = first_non_empty(&[&self.village, &self.town, &self.city, &self.suburb]);
        let admin = first_non_empty(&[&self.state, &self.province, &self.region]);

        let parts: Vec<&str> = [
            Some(self.road.as_str()),
            settlement,
            Some(self.county.as_str()),
            admin,
            Some(self.country.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Returns the first non-empty field.
fn first_non_empty<'a>(fields: &[&'a String]) -> Option<&'a str> {
    fields
        .iter()
        .map(|field| field.as_str())
        .find(|field| !field.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
