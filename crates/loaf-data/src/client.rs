//! HTTP client for the hosted data API's `PostgREST` endpoint.
//!
//! Reads (`select_all`, `select_in`) are retried on transient failures.
//! Writes (`update_location`, `insert_with_location`) are sent once and any
//! refusal is returned as [`DataError::Rejected`].

use std::time::Duration;

use loaf_core::{AppConfig, LocationRecord};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Map, Value};

use crate::error::DataError;
use crate::retry::retry_with_backoff;

/// Client for the hosted data API.
///
/// Use [`DataClient::from_config`] in the application or
/// [`DataClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct DataClient {
    client: Client,
    rest_url: Url,
    anon_key: String,
    access_token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DataClient {
    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`DataError::InvalidBaseUrl`] if `LOAF_DATA_URL` does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, DataError> {
        let mut client = Self::with_base_url(
            &config.data_url,
            &config.data_anon_key,
            config.data_timeout_secs,
        )?
        .with_retry(config.data_max_retries, config.data_retry_backoff_base_ms);
        if let Some(token) = &config.data_access_token {
            client = client.with_access_token(token);
        }
        Ok(client)
    }

    /// Creates a client for the backend at `base_url`; requests go to
    /// `<base_url>/rest/v1/`. Retries default to 3 with a 500 ms base.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`DataError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        anon_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/rest/v1/", base_url.trim_end_matches('/'));
        let rest_url = Url::parse(&normalised).map_err(|e| DataError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            rest_url,
            anon_key: anon_key.to_owned(),
            access_token: None,
            max_retries: 3,
            backoff_base_ms: 500,
        })
    }

    /// Sends `token` as the bearer credential instead of the anon key.
    #[must_use]
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches every row of `table`.
    ///
    /// # Errors
    ///
    /// - [`DataError::Throttled`] if the API still answers 429 after retries.
    /// - [`DataError::UnexpectedStatus`] on any other non-2xx status after retries.
    /// - [`DataError::Http`] on network failure after retries.
    /// - [`DataError::Deserialize`] if the body is not a JSON array.
    pub async fn select_all(&self, table: &str) -> Result<Vec<Value>, DataError> {
        let url = self.table_url(table, &[("select", "*")]);
        self.get_rows(url).await
    }

    /// Fetches `columns` of the rows of `table` whose `column` is one of `values`.
    ///
    /// An empty `values` slice returns no rows without a request.
    ///
    /// # Errors
    ///
    /// Same as [`DataClient::select_all`].
    pub async fn select_in(
        &self,
        table: &str,
        column: &str,
        values: &[String],
        columns: &str,
    ) -> Result<Vec<Value>, DataError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let filter = in_filter(values);
        let url = self.table_url(table, &[("select", columns), (column, &filter)]);
        self.get_rows(url).await
    }

    /// Replaces the `location` of row `id` in `table` with the encoded `record`.
    ///
    /// # Errors
    ///
    /// - [`DataError::Rejected`] if the API refuses the write.
    /// - [`DataError::NotFound`] if no row has that id.
    /// - [`DataError::Http`] on network failure.
    pub async fn update_location(
        &self,
        table: &str,
        id: &str,
        record: &LocationRecord,
    ) -> Result<(), DataError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(table, &[("id", &filter)]);
        let body = serde_json::json!({ "location": record.to_storage_string() });

        let request = self
            .authorized(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(&body);
        let rows = self.send_write(table, request).await?;

        if rows.is_empty() {
            return Err(DataError::NotFound {
                table: table.to_owned(),
                id: id.to_owned(),
            });
        }
        tracing::info!(%table, %id, address = %record.address, "location updated");
        Ok(())
    }

    /// Inserts a row built from `fields` plus the encoded `record` as its
    /// `location`, returning the created row.
    ///
    /// # Errors
    ///
    /// - [`DataError::Rejected`] if the API refuses the write or returns no row.
    /// - [`DataError::Http`] on network failure.
    pub async fn insert_with_location(
        &self,
        table: &str,
        mut fields: Map<String, Value>,
        record: &LocationRecord,
    ) -> Result<Value, DataError> {
        fields.insert(
            "location".to_string(),
            Value::String(record.to_storage_string()),
        );
        let url = self.table_url(table, &[]);

        let request = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(&Value::Object(fields));
        let rows = self.send_write(table, request).await?;

        rows.into_iter().next().ok_or_else(|| DataError::Rejected {
            table: table.to_owned(),
            status: 201,
            message: "insert returned no row".to_owned(),
        })
    }

    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.rest_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table);
        }
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn get_rows(&self, url: Url) -> Result<Vec<Value>, DataError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .authorized(self.client.get(url.clone()))
                    .send()
                    .await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(DataError::Throttled {
                        url: url.to_string(),
                        retry_after: retry_after(&response),
                    });
                }
                if !status.is_success() {
                    return Err(DataError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                parse_rows(response, url.as_str()).await
            }
        })
        .await
    }

    async fn send_write(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> Result<Vec<Value>, DataError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or(body);
            tracing::warn!(%table, status = status.as_u16(), %message, "write rejected");
            return Err(DataError::Rejected {
                table: table.to_owned(),
                status: status.as_u16(),
                message,
            });
        }
        parse_rows(response, table).await
    }
}

async fn parse_rows(response: Response, context: &str) -> Result<Vec<Value>, DataError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&body).map_err(|e| DataError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

/// Reads a delay-seconds `Retry-After` header. HTTP-date values are ignored
/// and fall back to the regular back-off.
fn retry_after(response: &Response) -> Option<Duration> {
    let secs = response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(secs))
}

/// Renders a `PostgREST` `in.(…)` filter, double-quoting every value.
fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}
