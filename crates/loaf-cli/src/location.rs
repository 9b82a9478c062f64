use loaf_core::{normalize_location_str, AppConfig, SourceTable};
use loaf_data::DataClient;

use crate::suggest::resolve_text;

pub(crate) fn run_normalize(raw: &str) -> anyhow::Result<()> {
    let record = normalize_location_str(raw);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Resolve `address` through the autocomplete engine and write it to the
/// record's `location`.
///
/// # Errors
///
/// Returns an error if the record does not exist or the data API rejects
/// the write. Geocoding failures are not errors: the typed text is stored
/// without coordinates.
pub(crate) async fn run_set_location(
    config: &AppConfig,
    table: SourceTable,
    id: &str,
    address: &str,
) -> anyhow::Result<()> {
    let record = resolve_text(config, address).await?;
    if record.coordinates().is_none() {
        tracing::warn!(%address, "address not found by the geocoder; storing text only");
    }

    let client = DataClient::from_config(config)?;
    client
        .update_location(table.table_name(), id, &record)
        .await?;

    println!("{table} {id}: {}", record.to_storage_string());
    Ok(())
}
