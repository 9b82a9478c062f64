use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::Coordinates;
use crate::CoreError;

/// Content thread, each backed by its own table in the hosted data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTable {
    Hacks,
    Deals,
    Events,
}

impl SourceTable {
    /// Every thread, in the order records are aggregated.
    pub const ALL: [SourceTable; 3] = [SourceTable::Hacks, SourceTable::Deals, SourceTable::Events];

    /// Name of the backing table.
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            SourceTable::Hacks => "hacks",
            SourceTable::Deals => "deals",
            SourceTable::Events => "events",
        }
    }
}

impl std::fmt::Display for SourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl std::str::FromStr for SourceTable {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hacks" => Ok(SourceTable::Hacks),
            "deals" => Ok(SourceTable::Deals),
            "events" => Ok(SourceTable::Events),
            _ => Err(CoreError::UnknownSourceTable(s.to_string())),
        }
    }
}

/// A record from any thread, resolved to a point on the map.
///
/// Only records with both coordinates resolved become a `MapEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEvent {
    /// Record id as stored, rendered as a string (`42` and `"42"` are the same id).
    pub id: String,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub source_table: SourceTable,
    pub poster_id: Option<Uuid>,
    pub poster_avatar_url: String,
    pub price: Option<f64>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl MapEvent {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// The set of threads currently shown on the map.
///
/// Starts as every thread. An empty selection shows nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSelection {
    selected: BTreeSet<SourceTable>,
}

impl Default for ThreadSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl ThreadSelection {
    #[must_use]
    pub fn all() -> Self {
        Self {
            selected: SourceTable::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn only(threads: impl IntoIterator<Item = SourceTable>) -> Self {
        Self {
            selected: threads.into_iter().collect(),
        }
    }

    /// Flips membership of `thread`; returns whether it is now selected.
    pub fn toggle(&mut self, thread: SourceTable) -> bool {
        if self.selected.remove(&thread) {
            false
        } else {
            self.selected.insert(thread);
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    #[must_use]
    pub fn contains(&self, thread: SourceTable) -> bool {
        self.selected.contains(&thread)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SourceTable> + '_ {
        self.selected.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_table_parses_case_insensitively() {
        assert_eq!("Deals".parse::<SourceTable>().unwrap(), SourceTable::Deals);
        assert_eq!(" hacks ".parse::<SourceTable>().unwrap(), SourceTable::Hacks);
        assert_eq!(
            "memes".parse::<SourceTable>().unwrap_err(),
            CoreError::UnknownSourceTable("memes".to_string())
        );
    }

    #[test]
    fn source_table_serializes_lowercase() {
        let json = serde_json::to_string(&SourceTable::Events).unwrap();
        assert_eq!(json, "\"events\"");
    }

    #[test]
    fn selection_starts_with_every_thread() {
        let selection = ThreadSelection::default();
        assert!(SourceTable::ALL.iter().all(|t| selection.contains(*t)));
    }

    #[test]
    fn toggle_removes_then_restores() {
        let mut selection = ThreadSelection::all();
        assert!(!selection.toggle(SourceTable::Deals));
        assert!(!selection.contains(SourceTable::Deals));
        assert!(selection.toggle(SourceTable::Deals));
        assert!(selection.contains(SourceTable::Deals));
    }

    #[test]
    fn cleared_selection_is_empty() {
        let mut selection = ThreadSelection::only([SourceTable::Hacks]);
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection, ThreadSelection::none());
    }
}
