//! HTTP client for a Nominatim-compatible `/search` endpoint.
//!
//! Wraps `reqwest` with status handling and lenient per-entry parsing: a
//! malformed entry is skipped instead of failing the whole response.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::GeocodeError;
use crate::label::format_label;
use crate::types::{GeocodeCandidate, NominatimPlace, SearchOptions};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Client for the geocoding suggestion service.
///
/// Use [`GeocodeClient::new`] for the public Nominatim instance or
/// [`GeocodeClient::with_base_url`] to point at a self-hosted instance or a
/// mock server in tests.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: Url,
}

impl GeocodeClient {
    /// Creates a client pointed at the public Nominatim search endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_BASE_URL, user_agent, timeout_secs)
    }

    /// Creates a client with a custom search endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, GeocodeError> {
        // Nominatim's usage policy requires an identifying User-Agent.
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Searches for addresses matching free text, in the service's ranking order.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::RateLimited`] on HTTP 429.
    /// - [`GeocodeError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::Deserialize`] if the body is not a JSON array.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let url = self.build_url(query, options);
        tracing::debug!(%query, limit = options.limit, "geocoder search");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        parse_candidates(&body, query)
    }

    fn build_url(&self, query: &str, options: &SearchOptions) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "jsonv2");
            pairs.append_pair("addressdetails", "1");
            pairs.append_pair("limit", &options.limit.to_string());
            if let Some(viewbox) = &options.viewbox {
                pairs.append_pair("viewbox", &viewbox.to_query_value());
                pairs.append_pair("bounded", "1");
            }
            if let Some(codes) = options.country_codes.as_deref().filter(|c| !c.is_empty()) {
                pairs.append_pair("countrycodes", codes);
            }
        }
        url
    }
}

/// Parses a search response body, keeping the service's order.
///
/// Entries that do not match the expected shape, or whose coordinates do
/// not parse, are skipped.
pub(crate) fn parse_candidates(
    body: &str,
    query: &str,
) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Deserialize {
            context: format!("search(q={query})"),
            source: e,
        })?;

    let candidates = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<NominatimPlace>(entry) {
            Ok(place) => to_candidate(place),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed geocoder entry");
                None
            }
        })
        .collect();

    Ok(candidates)
}

fn to_candidate(place: NominatimPlace) -> Option<GeocodeCandidate> {
    let lat = place.lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let lng = place.lon.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;

    let display_label = format_label(place.name.as_deref(), &place.display_name, &place.address);
    let place_id = place
        .place_id
        .map_or_else(|| format!("{lat},{lng}"), |id| id.to_string());

    Some(GeocodeCandidate {
        place_id,
        display_label,
        lat,
        lng,
        address: place.address,
    })
}

#[cfg(test)]
mod tests {
    use loaf_core::Viewbox;

    use super::*;

    fn test_client(base_url: &str) -> GeocodeClient {
        GeocodeClient::with_base_url(base_url, "loaf-test/0.1", 5)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_includes_bounding_box_and_limit() {
        let client = test_client("https://geo.example.com/search");
        let url = client.build_url("515 West Hastings", &SearchOptions::default());
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        let get = |k: &str| {
            query
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("q"), Some("515 West Hastings"));
        assert_eq!(get("format"), Some("jsonv2"));
        assert_eq!(get("addressdetails"), Some("1"));
        assert_eq!(get("limit"), Some("5"));
        assert_eq!(
            get("viewbox"),
            Some(Viewbox::METRO_VANCOUVER.to_query_value().as_str())
        );
        assert_eq!(get("bounded"), Some("1"));
        assert_eq!(get("countrycodes"), Some("ca"));
    }

    #[test]
    fn build_url_omits_optional_hints() {
        let client = test_client("https://geo.example.com/search");
        let options = SearchOptions {
            limit: 1,
            viewbox: None,
            country_codes: None,
        };
        let url = client.build_url("x & y", &options);
        assert!(!url.as_str().contains("viewbox"));
        assert!(!url.as_str().contains("countrycodes"));
        assert!(
            url.as_str().contains("q=x+%26+y"),
            "query should be percent-encoded: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GeocodeClient::with_base_url("not a url", "ua", 5).unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn parse_candidates_skips_entries_with_bad_coordinates() {
        let body = serde_json::json!([
            {"place_id": 1, "lat": "49.2827", "lon": "-123.1116", "display_name": "A",
             "address": {"house_number": "515", "road": "West Hastings Street", "city": "Vancouver"}},
            {"place_id": 2, "lat": "north", "lon": "-123.0", "display_name": "B"},
            {"place_id": 3, "display_name": "C"}
        ])
        .to_string();
        let candidates = parse_candidates(&body, "q").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].place_id, "1");
        assert_eq!(candidates[0].display_label, "515 West Hastings Street, Vancouver");
    }

    #[test]
    fn parse_candidates_rejects_non_array_body() {
        let err = parse_candidates("{\"error\":\"nope\"}", "q").unwrap_err();
        assert!(matches!(err, GeocodeError::Deserialize { .. }));
    }
}
