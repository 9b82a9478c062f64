//! Access to the hosted data API and the map event pipeline built on it.
//!
//! [`DataClient`] speaks the `PostgREST` dialect exposed by the backend
//! (`/rest/v1/<table>`). [`aggregate_events`] fans out over every thread
//! table, turns rows into [`loaf_core::MapEvent`]s and attaches poster
//! avatars from one batched profile lookup.

pub mod aggregate;
pub mod client;
pub mod error;
pub mod records;
mod retry;

pub use aggregate::{
    aggregate_events, attach_avatars, build_events, filter_by_threads, AggregateOptions,
};
pub use client::DataClient;
pub use error::DataError;
pub use records::map_event_from_record;
