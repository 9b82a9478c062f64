//! Address geocoding and autocomplete for location fields.
//!
//! [`GeocodeClient`] talks to a Nominatim-compatible search endpoint.
//! [`Autocomplete`] turns keystrokes into suggestions on top of any
//! [`SuggestionProvider`], with debouncing, a per-instance cache, and
//! cancellation of superseded requests.

pub mod autocomplete;
pub mod cache;
pub mod client;
pub mod error;
pub mod label;
pub mod provider;
pub mod types;

pub use autocomplete::{Autocomplete, AutocompleteEvent, AutocompleteSettings, AutocompleteState};
pub use cache::SuggestionCache;
pub use client::GeocodeClient;
pub use error::GeocodeError;
pub use label::format_label;
pub use provider::{BoundedGeocoder, SuggestionProvider};
pub use types::{AddressComponents, GeocodeCandidate, SearchOptions};
