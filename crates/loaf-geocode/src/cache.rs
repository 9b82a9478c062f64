use std::collections::HashMap;

use crate::types::GeocodeCandidate;

/// Successful suggestion results keyed by exact query string.
///
/// Owned by one autocomplete instance and never invalidated: an entry, once
/// written, is kept for the lifetime of the instance.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<String, Vec<GeocodeCandidate>>,
}

impl SuggestionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, query: &str) -> Option<&[GeocodeCandidate]> {
        self.entries.get(query).map(Vec::as_slice)
    }

    /// Stores `results` for `query` unless an entry already exists.
    pub fn insert(&mut self, query: impl Into<String>, results: Vec<GeocodeCandidate>) {
        self.entries.entry(query.into()).or_insert(results);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
