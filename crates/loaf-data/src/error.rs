use std::time::Duration;

use thiserror::Error;

/// Errors returned by the hosted data API client.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A read returned a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A read was throttled with 429. `retry_after` is the server's
    /// `Retry-After` hint, when it sent one in seconds.
    #[error("throttled by {url}")]
    Throttled {
        url: String,
        retry_after: Option<Duration>,
    },

    /// A write was refused by the API. Always surfaced to the caller.
    #[error("write to {table} rejected with status {status}: {message}")]
    Rejected {
        table: String,
        status: u16,
        message: String,
    },

    /// An update matched no row.
    #[error("no row with id {id} in {table}")]
    NotFound { table: String, id: String },

    #[error("invalid data API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
