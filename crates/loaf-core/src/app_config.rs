#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Bounding-box hint passed to the geocoder, in degrees.
///
/// Serialized in the `west,north,east,south` order the Nominatim `viewbox`
/// parameter expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewbox {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl Viewbox {
    /// Metro Vancouver, where the student audience lives.
    pub const METRO_VANCOUVER: Viewbox = Viewbox {
        west: -123.30,
        north: 49.40,
        east: -122.50,
        south: 49.00,
    };

    /// Renders the box as the comma-separated query parameter value.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        format!("{},{},{},{}", self.west, self.north, self.east, self.south)
    }
}

impl std::str::FromStr for Viewbox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        let [west, north, east, south] = parts.as_slice() else {
            return Err(format!(
                "expected 4 comma-separated numbers (west,north,east,south), got {}",
                parts.len()
            ));
        };

        if !(-180.0..=180.0).contains(west) || !(-180.0..=180.0).contains(east) {
            return Err("longitude out of range".to_string());
        }
        if !(-90.0..=90.0).contains(north) || !(-90.0..=90.0).contains(south) {
            return Err("latitude out of range".to_string());
        }
        if north <= south {
            return Err("north edge must be above south edge".to_string());
        }

        Ok(Viewbox {
            west: *west,
            north: *north,
            east: *east,
            south: *south,
        })
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub data_url: String,
    pub data_anon_key: String,
    pub data_access_token: Option<String>,
    pub data_timeout_secs: u64,
    pub data_max_retries: u32,
    pub data_retry_backoff_base_ms: u64,
    pub profiles_table: String,
    pub avatar_placeholder_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_viewbox: Viewbox,
    pub geocoder_country_codes: String,
    pub autocomplete_debounce_ms: u64,
    pub autocomplete_min_query_len: usize,
    pub autocomplete_result_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("data_url", &self.data_url)
            .field("data_anon_key", &"[redacted]")
            .field(
                "data_access_token",
                &self.data_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("data_timeout_secs", &self.data_timeout_secs)
            .field("data_max_retries", &self.data_max_retries)
            .field(
                "data_retry_backoff_base_ms",
                &self.data_retry_backoff_base_ms,
            )
            .field("profiles_table", &self.profiles_table)
            .field("avatar_placeholder_url", &self.avatar_placeholder_url)
            .field("geocoder_url", &self.geocoder_url)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_viewbox", &self.geocoder_viewbox)
            .field("geocoder_country_codes", &self.geocoder_country_codes)
            .field("autocomplete_debounce_ms", &self.autocomplete_debounce_ms)
            .field(
                "autocomplete_min_query_len",
                &self.autocomplete_min_query_len,
            )
            .field("autocomplete_result_limit", &self.autocomplete_result_limit)
            .finish()
    }
}
