//! Geocoding commands: raw suggestions and type-then-blur resolution.

use std::sync::Arc;

use loaf_core::{AppConfig, LocationRecord};
use loaf_geocode::{Autocomplete, AutocompleteSettings, BoundedGeocoder, SuggestionProvider};

/// Print the geocoder's suggestions for `query`, best first.
///
/// # Errors
///
/// Returns an error if the geocoder cannot be built or the request fails.
pub(crate) async fn run_suggest(
    config: &AppConfig,
    query: &str,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    let geocoder = BoundedGeocoder::from_config(config)?;
    let limit = limit.unwrap_or(geocoder.options().limit);
    let candidates = geocoder.suggest(query.trim(), limit).await?;

    if candidates.is_empty() {
        println!("no suggestions for '{}'", query.trim());
        return Ok(());
    }
    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "{:>2}. {}  ({:.5}, {:.5})",
            i + 1,
            candidate.display_label,
            candidate.lat,
            candidate.lng
        );
    }
    Ok(())
}

pub(crate) async fn run_resolve(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let record = resolve_text(config, text).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Feeds `text` to a fresh autocomplete engine and blurs it.
///
/// Geocoder failures are absorbed by the engine, so the result is at worst
/// the typed text without coordinates.
pub(crate) async fn resolve_text(config: &AppConfig, text: &str) -> anyhow::Result<LocationRecord> {
    let geocoder = Arc::new(BoundedGeocoder::from_config(config)?);
    let (autocomplete, _events) =
        Autocomplete::spawn(geocoder, AutocompleteSettings::from_config(config));

    autocomplete.input(text);
    autocomplete
        .blur()
        .await
        .ok_or_else(|| anyhow::anyhow!("autocomplete engine stopped before resolving '{text}'"))
}
