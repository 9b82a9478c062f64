//! Event aggregation across thread tables, plus thread filtering.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;

use futures::future::join_all;
use loaf_core::{AppConfig, MapEvent, SourceTable, ThreadSelection};
use serde_json::Value;
use uuid::Uuid;

use crate::client::DataClient;
use crate::records::map_event_from_record;

/// Where poster avatars live and what to show when one is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub profiles_table: String,
    pub avatar_placeholder_url: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            profiles_table: "profiles".to_string(),
            avatar_placeholder_url: "/images/default-avatar.png".to_string(),
        }
    }
}

impl AggregateOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            profiles_table: config.profiles_table.clone(),
            avatar_placeholder_url: config.avatar_placeholder_url.clone(),
        }
    }
}

/// Loads every thread table and returns the map-ready events.
///
/// The table fetches run concurrently; aggregation continues once all have
/// settled. A table that fails to load contributes no events, and a failed
/// avatar lookup leaves every event with the placeholder. Neither failure
/// is returned to the caller.
pub async fn aggregate_events(client: &DataClient, options: &AggregateOptions) -> Vec<MapEvent> {
    let fetches = SourceTable::ALL
        .into_iter()
        .map(|table| async move { (table, client.select_all(table.table_name()).await) });

    let batches = join_all(fetches)
        .await
        .into_iter()
        .filter_map(|(table, result)| match result {
            Ok(rows) => Some((table, rows)),
            Err(e) => {
                tracing::warn!(%table, error = %e, "failed to load thread; showing none of it");
                None
            }
        })
        .collect();

    let mut events = build_events(batches);

    let poster_ids = unique_poster_ids(&events);
    let avatars = if poster_ids.is_empty() {
        HashMap::new()
    } else {
        fetch_avatars(client, &options.profiles_table, &poster_ids).await
    };
    attach_avatars(&mut events, &avatars, &options.avatar_placeholder_url);

    tracing::info!(count = events.len(), "aggregated map events");
    events
}

/// Converts fetched rows into events, in table-then-row order.
///
/// Rows without coordinates are dropped. When an id repeats, the first
/// occurrence is kept.
#[must_use]
pub fn build_events(batches: Vec<(SourceTable, Vec<Value>)>) -> Vec<MapEvent> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for (table, rows) in batches {
        for row in &rows {
            let Some(event) = map_event_from_record(table, row) else {
                continue;
            };
            if !seen.insert(event.id.clone()) {
                tracing::warn!(%table, id = %event.id, "duplicate event id; keeping the first");
                continue;
            }
            events.push(event);
        }
    }
    events
}

/// Fills in `poster_avatar_url`, using `placeholder` when no avatar is known.
pub fn attach_avatars<S: BuildHasher>(
    events: &mut [MapEvent],
    avatars: &HashMap<Uuid, String, S>,
    placeholder: &str,
) {
    for event in events {
        event.poster_avatar_url = event
            .poster_id
            .and_then(|id| avatars.get(&id))
            .filter(|url| !url.trim().is_empty())
            .map_or_else(|| placeholder.to_string(), Clone::clone);
    }
}

/// Events whose thread is in `selection`, in their original order.
///
/// An empty selection matches nothing.
pub fn filter_by_threads<'a>(
    events: &'a [MapEvent],
    selection: &'a ThreadSelection,
) -> impl Iterator<Item = &'a MapEvent> + 'a {
    events
        .iter()
        .filter(move |event| selection.contains(event.source_table))
}

fn unique_poster_ids(events: &[MapEvent]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter_map(|e| e.poster_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

async fn fetch_avatars(
    client: &DataClient,
    profiles_table: &str,
    poster_ids: &[Uuid],
) -> HashMap<Uuid, String> {
    let ids: Vec<String> = poster_ids.iter().map(Uuid::to_string).collect();
    match client
        .select_in(profiles_table, "id", &ids, "id,avatar_url")
        .await
    {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                let id = Uuid::parse_str(row.get("id")?.as_str()?).ok()?;
                let url = row.get("avatar_url")?.as_str()?.to_string();
                Some((id, url))
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "avatar lookup failed; using placeholders");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::BuildHasherDefault;

    use serde_json::json;

    use super::*;

    const POSTER: &str = "0b7e2d4c-1f3a-4c5e-9d8b-7a6f5e4d3c2b";

    #[test]
    fn records_without_coordinates_are_dropped() {
        let batches = vec![(
            SourceTable::Events,
            vec![
                json!({"id": 1, "title": "A", "lat": 49.28, "lng": -123.12}),
                json!({"id": 2, "title": "B", "location": null}),
                json!({"id": 3, "title": "C",
                       "location": "{\"address\":\"X\",\"lat\":49.3,\"lng\":-123.1}"}),
            ],
        )];
        let events = build_events(batches);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn order_is_table_then_fetch_order() {
        let batches = vec![
            (
                SourceTable::Hacks,
                vec![
                    json!({"id": "h2", "lat": 49.0, "lng": -123.0}),
                    json!({"id": "h1", "lat": 49.0, "lng": -123.0}),
                ],
            ),
            (
                SourceTable::Deals,
                vec![json!({"id": "d1", "lat": 49.0, "lng": -123.0})],
            ),
        ];
        let events = build_events(batches);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["h2", "h1", "d1"]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let batches = vec![
            (
                SourceTable::Hacks,
                vec![json!({"id": 5, "title": "hack", "lat": 49.0, "lng": -123.0})],
            ),
            (
                SourceTable::Deals,
                vec![json!({"id": "5", "title": "deal", "lat": 49.1, "lng": -123.1})],
            ),
        ];
        let events = build_events(batches);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "hack");
    }

    #[test]
    fn avatars_fall_back_to_placeholder() {
        let poster = Uuid::parse_str(POSTER).unwrap();
        let stranger = Uuid::new_v4();
        let mut events = build_events(vec![(
            SourceTable::Deals,
            vec![
                json!({"id": 1, "lat": 49.0, "lng": -123.0, "user_id": POSTER}),
                json!({"id": 2, "lat": 49.0, "lng": -123.0, "user_id": stranger.to_string()}),
                json!({"id": 3, "lat": 49.0, "lng": -123.0}),
            ],
        )]);
        let avatars = HashMap::from([(poster, "https://cdn.example.com/a.png".to_string())]);

        attach_avatars(&mut events, &avatars, "/placeholder.png");

        assert_eq!(events[0].poster_avatar_url, "https://cdn.example.com/a.png");
        assert_eq!(events[1].poster_avatar_url, "/placeholder.png");
        assert_eq!(events[2].poster_avatar_url, "/placeholder.png");
    }

    #[test]
    fn avatar_lookup_accepts_any_hasher() {
        let poster = Uuid::parse_str(POSTER).unwrap();
        let mut events = build_events(vec![(
            SourceTable::Hacks,
            vec![json!({"id": 1, "lat": 49.0, "lng": -123.0, "user_id": POSTER})],
        )]);
        let mut avatars: HashMap<Uuid, String, BuildHasherDefault<DefaultHasher>> =
            HashMap::default();
        avatars.insert(poster, "https://cdn.example.com/b.png".to_string());

        attach_avatars(&mut events, &avatars, "/placeholder.png");

        assert_eq!(events[0].poster_avatar_url, "https://cdn.example.com/b.png");
    }

    #[test]
    fn blank_avatar_url_uses_placeholder() {
        let poster = Uuid::parse_str(POSTER).unwrap();
        let mut events = build_events(vec![(
            SourceTable::Deals,
            vec![json!({"id": 1, "lat": 49.0, "lng": -123.0, "user_id": POSTER})],
        )]);
        let avatars = HashMap::from([(poster, "  ".to_string())]);
        attach_avatars(&mut events, &avatars, "/placeholder.png");
        assert_eq!(events[0].poster_avatar_url, "/placeholder.png");
    }

    #[test]
    fn filter_keeps_selected_threads_only() {
        let events = build_events(vec![
            (
                SourceTable::Hacks,
                vec![json!({"id": "h", "lat": 49.0, "lng": -123.0})],
            ),
            (
                SourceTable::Deals,
                vec![json!({"id": "d", "lat": 49.0, "lng": -123.0})],
            ),
            (
                SourceTable::Events,
                vec![json!({"id": "e", "lat": 49.0, "lng": -123.0})],
            ),
        ]);

        let all = ThreadSelection::all();
        assert_eq!(filter_by_threads(&events, &all).count(), 3);

        let deals = ThreadSelection::only([SourceTable::Deals]);
        let ids: Vec<&str> = filter_by_threads(&events, &deals)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["d"]);

        let none = ThreadSelection::none();
        assert_eq!(filter_by_threads(&events, &none).count(), 0);
    }

    #[test]
    fn unique_poster_ids_preserve_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let events = build_events(vec![(
            SourceTable::Events,
            vec![
                json!({"id": 1, "lat": 49.0, "lng": -123.0, "user_id": b.to_string()}),
                json!({"id": 2, "lat": 49.0, "lng": -123.0, "user_id": a.to_string()}),
                json!({"id": 3, "lat": 49.0, "lng": -123.0, "user_id": b.to_string()}),
            ],
        )]);
        assert_eq!(unique_poster_ids(&events), vec![b, a]);
    }
}
