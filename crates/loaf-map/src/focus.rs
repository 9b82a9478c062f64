use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// Query parameter carrying the id of the event to focus.
pub const FOCUS_PARAM: &str = "focus";

/// A request from outside the map to focus one event by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub target_id: String,
}

impl FocusRequest {
    /// Returns `None` for a blank id.
    #[must_use]
    pub fn new(target_id: &str) -> Option<Self> {
        let target_id = target_id.trim();
        (!target_id.is_empty()).then(|| Self {
            target_id: target_id.to_owned(),
        })
    }

    /// Reads the `focus` parameter from a URL query string (with or without
    /// the leading `?`). The first non-blank occurrence wins.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter(|(key, _)| *key == FOCUS_PARAM)
            .find_map(|(_, value)| {
                let value = value.replace('+', " ");
                let decoded = percent_decode_str(&value).decode_utf8().ok()?;
                Self::new(&decoded)
            })
    }

    /// The query string other pages link with, e.g. `focus=42`.
    #[must_use]
    pub fn to_query(&self) -> String {
        let encoded = utf8_percent_encode(&self.target_id, NON_ALPHANUMERIC);
        format!("{FOCUS_PARAM}={encoded}")
    }
}
