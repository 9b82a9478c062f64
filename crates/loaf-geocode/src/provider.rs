use std::future::Future;

use loaf_core::AppConfig;

use crate::client::GeocodeClient;
use crate::error::GeocodeError;
use crate::types::{GeocodeCandidate, SearchOptions};

/// Source of ranked address suggestions for free text.
///
/// The autocomplete engine runs each call on its own task so it can abort
/// superseded requests, hence the `Send + 'static` bounds.
pub trait SuggestionProvider: Send + Sync + 'static {
    /// Returns at most `limit` candidates, best first.
    fn suggest(
        &self,
        query: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<GeocodeCandidate>, GeocodeError>> + Send;
}

/// A [`GeocodeClient`] bound to fixed search hints (bounding box, countries).
#[derive(Debug, Clone)]
pub struct BoundedGeocoder {
    client: GeocodeClient,
    options: SearchOptions,
}

impl BoundedGeocoder {
    #[must_use]
    pub fn new(client: GeocodeClient, options: SearchOptions) -> Self {
        Self { client, options }
    }

    /// Builds the client and search hints from configuration.
    ///
    /// # Errors
    ///
    /// Same as [`GeocodeClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        let client = GeocodeClient::with_base_url(
            &config.geocoder_url,
            &config.geocoder_user_agent,
            config.geocoder_timeout_secs,
        )?;
        Ok(Self::new(client, SearchOptions::from_config(config)))
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }
}

impl SuggestionProvider for BoundedGeocoder {
    async fn suggest(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let options = SearchOptions {
            limit,
            ..self.options.clone()
        };
        self.client.search(query, &options).await
    }
}
