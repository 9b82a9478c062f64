//! Canonical location shape and the normalizer that produces it.
//!
//! Stored `location` fields come in three shapes: a plain address string, a
//! JSON-encoded `{address, lat, lng}` string, or an already-structured
//! object. [`normalize_location`] is the single entry point that interprets
//! them; everything downstream consumes [`LocationRecord`] only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resolved latitude/longitude pair (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// The canonical `{address, lat, lng}` location shape.
///
/// `lat` and `lng` are either both `Some` or both `None` when produced by
/// this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationRecord {
    /// A record for a resolved address.
    #[must_use]
    pub fn resolved(address: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            address: address.into(),
            lat: Some(coords.lat),
            lng: Some(coords.lng),
        }
    }

    /// A record that only carries the typed text.
    #[must_use]
    pub fn address_only(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            lat: None,
            lng: None,
        }
    }

    /// Returns the coordinate pair when both halves are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.lat?,
            lng: self.lng?,
        })
    }

    /// Encodes the record in the form persisted in a record's `location` column.
    #[must_use]
    pub fn to_storage_string(&self) -> String {
        serde_json::json!({
            "address": self.address,
            "lat": self.lat,
            "lng": self.lng,
        })
        .to_string()
    }
}

/// The three accepted raw shapes, plus the degenerate cases.
enum RawLocation<'a> {
    Missing,
    Text(&'a str),
    Structured(&'a Map<String, Value>),
    Unsupported(&'a Value),
}

impl<'a> RawLocation<'a> {
    fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawLocation::Missing,
            Some(Value::String(s)) => RawLocation::Text(s),
            Some(Value::Object(map)) => RawLocation::Structured(map),
            Some(other) => RawLocation::Unsupported(other),
        }
    }
}

/// Normalizes a raw `location` field value into a [`LocationRecord`].
///
/// Never fails: unparseable or partial input degrades to an address-only or
/// empty record. `None` and JSON `null` yield the empty record.
#[must_use]
pub fn normalize_location(value: Option<&Value>) -> LocationRecord {
    match RawLocation::classify(value) {
        RawLocation::Missing => LocationRecord::default(),
        RawLocation::Text(text) => normalize_location_str(text),
        RawLocation::Structured(map) => from_fields(map),
        RawLocation::Unsupported(other) => {
            tracing::warn!(value = %other, "unsupported location shape; treating as empty");
            LocationRecord::default()
        }
    }
}

/// Normalizes a location stored as text, which may or may not be JSON.
#[must_use]
pub fn normalize_location_str(text: &str) -> LocationRecord {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => from_fields(&map),
        Ok(_) => LocationRecord::address_only(text),
        Err(e) => {
            if text.trim_start().starts_with('{') {
                tracing::warn!(error = %e, "malformed location JSON; keeping raw text as address");
            }
            LocationRecord::address_only(text)
        }
    }
}

/// Returns a human-readable address for a raw stored location, falling back
/// to the raw string when normalization yields no address.
#[must_use]
pub fn display_address(value: Option<&Value>) -> String {
    let record = normalize_location(value);
    if !record.address.is_empty() {
        return record.address;
    }
    if let Some(Value::String(raw)) = value {
        raw.clone()
    } else {
        String::new()
    }
}

/// Extracts a coordinate pair, accepting JSON numbers or numeric strings.
///
/// Returns `None` unless both halves are present and finite. Values are not
/// range-checked, so any stored pair survives re-normalization.
#[must_use]
pub fn coordinate_pair(lat: Option<&Value>, lng: Option<&Value>) -> Option<Coordinates> {
    let lat = lat.and_then(as_coordinate)?;
    let lng = lng.and_then(as_coordinate)?;
    Some(Coordinates { lat, lng })
}

fn as_coordinate(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn from_fields(map: &Map<String, Value>) -> LocationRecord {
    let address = map
        .get("address")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match coordinate_pair(map.get("lat"), map.get("lng")) {
        Some(coords) => LocationRecord::resolved(address, coords),
        None => {
            if map.contains_key("lat") || map.contains_key("lng") {
                let has_values = [map.get("lat"), map.get("lng")]
                    .into_iter()
                    .any(|v| v.is_some_and(|v| !v.is_null()));
                if has_values {
                    tracing::warn!(%address, "discarding partial or non-numeric coordinates");
                }
            }
            LocationRecord::address_only(address)
        }
    }
}
