//! Conversion from raw thread rows to [`MapEvent`]s.

use chrono::{NaiveDate, NaiveTime};
use loaf_core::{coordinate_pair, normalize_location, Coordinates, MapEvent, SourceTable};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Converts one row of `table` into a [`MapEvent`].
///
/// Coordinates come from top-level `lat`/`lng` columns when both are
/// present, otherwise from the `location` field via the normalizer.
/// Returns `None` for rows without an id or without resolvable coordinates.
/// The avatar URL is left empty; see [`crate::attach_avatars`].
#[must_use]
pub fn map_event_from_record(table: SourceTable, record: &Value) -> Option<MapEvent> {
    let row = record.as_object()?;

    let Some(id) = record_id(row.get("id")) else {
        tracing::warn!(%table, "skipping row without a usable id");
        return None;
    };

    let Some(coords) = resolve_coordinates(row) else {
        tracing::debug!(%table, %id, "skipping row without coordinates");
        return None;
    };

    Some(MapEvent {
        title: text_field(row, "title")
            .or_else(|| text_field(row, "name"))
            .unwrap_or_default(),
        description: text_field(row, "description").unwrap_or_default(),
        lat: coords.lat,
        lng: coords.lng,
        source_table: table,
        poster_id: row
            .get("user_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok()),
        poster_avatar_url: String::new(),
        price: row.get("price").and_then(number_field),
        date: row.get("date").and_then(Value::as_str).and_then(parse_date),
        time: row.get("time").and_then(Value::as_str).and_then(parse_time),
        id,
    })
}

fn resolve_coordinates(row: &Map<String, Value>) -> Option<Coordinates> {
    coordinate_pair(row.get("lat"), row.get("lng"))
        .or_else(|| normalize_location(row.get("location")).coordinates())
}

fn record_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn text_field(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_field(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Accepts `YYYY-MM-DD`, or a timestamp starting with one.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Accepts `HH:MM:SS` or `HH:MM`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn top_level_coordinates_are_used() {
        let row = json!({"id": 7, "title": "Free pizza", "lat": 49.28, "lng": -123.12});
        let event = map_event_from_record(SourceTable::Events, &row).unwrap();
        assert_eq!(event.id, "7");
        assert_eq!(event.title, "Free pizza");
        assert_eq!(event.source_table, SourceTable::Events);
        assert_eq!((event.lat, event.lng), (49.28, -123.12));
    }

    #[test]
    fn embedded_location_json_is_used_when_no_top_level_pair() {
        let row = json!({
            "id": "a-1",
            "title": "Cheap coffee",
            "lat": null,
            "location": "{\"address\":\"X\",\"lat\":49.3,\"lng\":-123.1}"
        });
        let event = map_event_from_record(SourceTable::Deals, &row).unwrap();
        assert_eq!(event.id, "a-1");
        assert_eq!((event.lat, event.lng), (49.3, -123.1));
    }

    #[test]
    fn rows_without_coordinates_are_skipped() {
        let row = json!({"id": 1, "title": "Somewhere", "location": "Main Mall"});
        assert!(map_event_from_record(SourceTable::Hacks, &row).is_none());
        let row = json!({"id": 2, "location": null});
        assert!(map_event_from_record(SourceTable::Hacks, &row).is_none());
    }

    #[test]
    fn rows_without_id_are_skipped() {
        let row = json!({"title": "No id", "lat": 49.0, "lng": -123.0});
        assert!(map_event_from_record(SourceTable::Hacks, &row).is_none());
    }

    #[test]
    fn optional_details_are_parsed() {
        let row = json!({
            "id": 3,
            "title": "Study night",
            "description": "Bring snacks",
            "lat": "49.26",
            "lng": "-123.25",
            "user_id": "6f1c8a1e-4a53-4f0b-9a4c-3b8d2f1e7c10",
            "price": "$4.50",
            "date": "2025-03-14T00:00:00+00:00",
            "time": "18:30"
        });
        let event = map_event_from_record(SourceTable::Events, &row).unwrap();
        assert_eq!(event.description, "Bring snacks");
        assert_eq!(event.price, Some(4.5));
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(event.time, NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(
            event.poster_id.map(|u| u.to_string()).as_deref(),
            Some("6f1c8a1e-4a53-4f0b-9a4c-3b8d2f1e7c10")
        );
    }

    #[test]
    fn unparseable_details_become_none() {
        let row = json!({
            "id": 4,
            "lat": 49.0,
            "lng": -123.0,
            "user_id": "not-a-uuid",
            "price": "free",
            "date": "soon",
            "time": "evening"
        });
        let event = map_event_from_record(SourceTable::Deals, &row).unwrap();
        assert!(event.poster_id.is_none());
        assert!(event.price.is_none());
        assert!(event.date.is_none());
        assert!(event.time.is_none());
        assert_eq!(event.title, "");
    }
}
