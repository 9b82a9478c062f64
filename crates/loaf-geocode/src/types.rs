//! Wire types for the Nominatim `jsonv2` search response and the candidate
//! shape the rest of the crate works with.

use loaf_core::{AppConfig, Coordinates, LocationRecord, Viewbox};
use serde::{Deserialize, Serialize};

/// Structured address parts from `addressdetails=1`.
///
/// Every field is optional; Nominatim only returns the parts it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponents {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl AddressComponents {
    /// The most specific settlement name available.
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village]
            .into_iter()
            .filter_map(Option::as_deref)
            .find(|s| !s.trim().is_empty())
    }
}

/// One entry of a Nominatim search response.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub place_id: Option<u64>,
    /// Nominatim returns coordinates as decimal strings.
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: AddressComponents,
}

/// A suggestion for the typed text, valid only within one autocomplete session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub place_id: String,
    pub display_label: String,
    pub lat: f64,
    pub lng: f64,
    pub address: AddressComponents,
}

impl GeocodeCandidate {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// The canonical record emitted when this candidate is picked.
    #[must_use]
    pub fn to_location_record(&self) -> LocationRecord {
        LocationRecord::resolved(self.display_label.clone(), self.coordinates())
    }
}

/// Parameters for a single search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub limit: u32,
    pub viewbox: Option<Viewbox>,
    /// Comma-separated ISO 3166-1 alpha-2 codes, e.g. `"ca"`.
    pub country_codes: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            viewbox: Some(Viewbox::METRO_VANCOUVER),
            country_codes: Some("ca".to_string()),
        }
    }
}

impl SearchOptions {
    /// Search hints from configuration; a blank country list sends none.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let country_codes = config.geocoder_country_codes.trim();
        Self {
            limit: config.autocomplete_result_limit,
            viewbox: Some(config.geocoder_viewbox),
            country_codes: (!country_codes.is_empty()).then(|| country_codes.to_string()),
        }
    }
}
