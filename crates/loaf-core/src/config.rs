use crate::app_config::{AppConfig, Environment, Viewbox};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let data_url = require("LOAF_DATA_URL")?;
    let data_anon_key = require("LOAF_DATA_ANON_KEY")?;
    let data_access_token = lookup("LOAF_DATA_ACCESS_TOKEN")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let env = parse_environment(&or_default("LOAF_ENV", "development"));
    let log_level = or_default("LOAF_LOG_LEVEL", "info");

    let data_timeout_secs = parse_u64("LOAF_DATA_TIMEOUT_SECS", "30")?;
    let data_max_retries = parse_u32("LOAF_DATA_MAX_RETRIES", "3")?;
    let data_retry_backoff_base_ms = parse_u64("LOAF_DATA_RETRY_BACKOFF_BASE_MS", "500")?;
    let profiles_table = or_default("LOAF_PROFILES_TABLE", "profiles");
    let avatar_placeholder_url =
        or_default("LOAF_AVATAR_PLACEHOLDER_URL", "/images/default-avatar.png");

    let geocoder_url = or_default(
        "LOAF_GEOCODER_URL",
        "https://nominatim.openstreetmap.org/search",
    );
    let geocoder_user_agent = or_default(
        "LOAF_GEOCODER_USER_AGENT",
        "loaf-life/0.1 (address-autocomplete)",
    );
    let geocoder_timeout_secs = parse_u64("LOAF_GEOCODER_TIMEOUT_SECS", "10")?;
    let geocoder_viewbox = lookup("LOAF_GEOCODER_VIEWBOX").map_or(
        Ok(Viewbox::METRO_VANCOUVER),
        |raw| {
            raw.parse::<Viewbox>()
                .map_err(|reason| ConfigError::InvalidEnvVar {
                    var: "LOAF_GEOCODER_VIEWBOX".to_string(),
                    reason,
                })
        },
    )?;
    let geocoder_country_codes = or_default("LOAF_GEOCODER_COUNTRY_CODES", "ca");

    let autocomplete_debounce_ms = parse_u64("LOAF_AUTOCOMPLETE_DEBOUNCE_MS", "300")?;
    let autocomplete_min_query_len = parse_usize("LOAF_AUTOCOMPLETE_MIN_QUERY_LEN", "5")?;
    let autocomplete_result_limit = parse_u32("LOAF_AUTOCOMPLETE_RESULT_LIMIT", "5")?;
    if autocomplete_result_limit == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOAF_AUTOCOMPLETE_RESULT_LIMIT".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        data_url,
        data_anon_key,
        data_access_token,
        data_timeout_secs,
        data_max_retries,
        data_retry_backoff_base_ms,
        profiles_table,
        avatar_placeholder_url,
        geocoder_url,
        geocoder_user_agent,
        geocoder_timeout_secs,
        geocoder_viewbox,
        geocoder_country_codes,
        autocomplete_debounce_ms,
        autocomplete_min_query_len,
        autocomplete_result_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
