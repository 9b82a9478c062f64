//! Map event listing and the offline focus flight.

use loaf_core::{AppConfig, Coordinates, MapEvent, SourceTable, ThreadSelection, Viewbox};
use loaf_data::{aggregate_events, filter_by_threads, AggregateOptions, DataClient};
use loaf_map::{CameraController, FocusOutcome, FocusRequest, MercatorViewport, ViewportSize};

/// Zoom of the overview camera before a focus flight.
const OVERVIEW_ZOOM: f64 = 12.0;

/// No `--thread` flags means every thread.
fn selection(threads: &[SourceTable]) -> ThreadSelection {
    if threads.is_empty() {
        ThreadSelection::all()
    } else {
        ThreadSelection::only(threads.iter().copied())
    }
}

fn overview_center(viewbox: &Viewbox) -> Coordinates {
    Coordinates {
        lat: f64::midpoint(viewbox.north, viewbox.south),
        lng: f64::midpoint(viewbox.west, viewbox.east),
    }
}

async fn load_events(
    config: &AppConfig,
    threads: &[SourceTable],
) -> anyhow::Result<Vec<MapEvent>> {
    let client = DataClient::from_config(config)?;
    let events = aggregate_events(&client, &AggregateOptions::from_config(config)).await;
    let selection = selection(threads);
    Ok(filter_by_threads(&events, &selection).cloned().collect())
}

/// List map events, one per line.
///
/// # Errors
///
/// Returns an error if the data client cannot be built. Tables that fail to
/// load are skipped by aggregation.
pub(crate) async fn run_events(config: &AppConfig, threads: &[SourceTable]) -> anyhow::Result<()> {
    let events = load_events(config, threads).await?;

    if events.is_empty() {
        println!("no events with a location");
        return Ok(());
    }

    let header = format!("{:<10}{:<8}{:<24}TITLE", "ID", "THREAD", "LAT,LNG");
    println!("{header}");
    for event in &events {
        let title = if event.title.chars().count() > 50 {
            format!("{}...", event.title.chars().take(50).collect::<String>())
        } else {
            event.title.clone()
        };
        let thread = event.source_table.to_string();
        let coords = format!("{:.5},{:.5}", event.lat, event.lng);
        println!("{:<10}{thread:<8}{coords:<24}{title}", event.id);
    }
    println!("{} event(s)", events.len());
    Ok(())
}

/// Focus one event on an in-memory viewport and print the camera path.
///
/// # Errors
///
/// Returns an error for a blank target or a non-positive viewport size.
pub(crate) async fn run_focus(
    config: &AppConfig,
    target: &str,
    width: f64,
    height: f64,
    threads: &[SourceTable],
) -> anyhow::Result<()> {
    anyhow::ensure!(
        width > 0.0 && height > 0.0,
        "viewport size must be positive, got {width}x{height}"
    );
    let request = if target.contains('=') {
        FocusRequest::from_query(target)
    } else {
        FocusRequest::new(target)
    }
    .ok_or_else(|| anyhow::anyhow!("no focus target in '{target}'"))?;

    let events = load_events(config, threads).await?;

    let mut viewport = MercatorViewport::new(
        ViewportSize { width, height },
        overview_center(&config.geocoder_viewbox),
        OVERVIEW_ZOOM,
    );
    let mut controller = CameraController::new();

    match controller.apply(&mut viewport, &events, &request).await {
        FocusOutcome::Focused => {
            for (i, (center, zoom)) in viewport.flights().iter().enumerate() {
                println!(
                    "flight {}: center {:.6},{:.6} zoom {zoom}",
                    i + 1,
                    center.lat,
                    center.lng
                );
            }
            for id in viewport.opened_popups() {
                println!("popup opened for event {id}");
            }
        }
        FocusOutcome::AlreadyFocused => {
            println!("event {} was already focused", request.target_id);
        }
        FocusOutcome::NotFound => {
            println!("no loaded event with id {}", request.target_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_threads_selects_all() {
        assert_eq!(selection(&[]), ThreadSelection::all());
    }

    #[test]
    fn listed_threads_select_only_those() {
        let s = selection(&[SourceTable::Deals, SourceTable::Events]);
        assert!(!s.contains(SourceTable::Hacks));
        assert!(s.contains(SourceTable::Deals));
        assert!(s.contains(SourceTable::Events));
    }

    #[test]
    fn overview_is_viewbox_center() {
        let center = overview_center(&Viewbox::METRO_VANCOUVER);
        assert!((center.lat - 49.2).abs() < 1e-9);
        assert!((center.lng - -122.9).abs() < 1e-9);
    }
}
