use std::future::Future;
use std::time::Duration;

use loaf_core::Coordinates;

use crate::correction::{ScreenPoint, ViewportSize};
use crate::projection::{self, WorldPoint};

/// The slice of a map rendering library the camera controller drives.
pub trait MapViewport: Send {
    /// Animates the camera to `center` at `zoom`; resolves once the move has
    /// ended.
    fn fly_to(&mut self, center: Coordinates, zoom: f64) -> impl Future<Output = ()> + Send;

    /// Screen position of `coords` in the current camera.
    fn project(&self, coords: Coordinates) -> ScreenPoint;

    /// Geographic position under the screen point `point`.
    fn unproject(&self, point: ScreenPoint) -> Coordinates;

    fn size(&self) -> ViewportSize;

    /// Opens the popup of the marker for `event_id`.
    fn open_popup(&mut self, event_id: &str);
}

/// In-memory Web-Mercator viewport.
///
/// Keeps the camera as a center and zoom, records every completed flight
/// and opened popup, and optionally takes `flight_time` per move.
#[derive(Debug, Clone)]
pub struct MercatorViewport {
    size: ViewportSize,
    center: Coordinates,
    zoom: f64,
    flight_time: Duration,
    flights: Vec<(Coordinates, f64)>,
    popups: Vec<String>,
}

impl MercatorViewport {
    #[must_use]
    pub fn new(size: ViewportSize, center: Coordinates, zoom: f64) -> Self {
        Self {
            size,
            center,
            zoom,
            flight_time: Duration::ZERO,
            flights: Vec::new(),
            popups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flight_time(mut self, flight_time: Duration) -> Self {
        self.flight_time = flight_time;
        self
    }

    #[must_use]
    pub fn center(&self) -> Coordinates {
        self.center
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Completed flights as `(center, zoom)`, oldest first.
    #[must_use]
    pub fn flights(&self) -> &[(Coordinates, f64)] {
        &self.flights
    }

    #[must_use]
    pub fn opened_popups(&self) -> &[String] {
        &self.popups
    }

    fn center_world(&self) -> WorldPoint {
        projection::project(self.center, self.zoom)
    }
}

impl MapViewport for MercatorViewport {
    async fn fly_to(&mut self, center: Coordinates, zoom: f64) {
        if !self.flight_time.is_zero() {
            tokio::time::sleep(self.flight_time).await;
        }
        self.center = center;
        self.zoom = zoom;
        self.flights.push((center, zoom));
        tracing::debug!(lat = center.lat, lng = center.lng, zoom, "camera moved");
    }

    fn project(&self, coords: Coordinates) -> ScreenPoint {
        let world = projection::project(coords, self.zoom);
        let origin = self.center_world();
        let mid = self.size.center();
        ScreenPoint {
            x: mid.x + (world.x - origin.x),
            y: mid.y + (world.y - origin.y),
        }
    }

    fn unproject(&self, point: ScreenPoint) -> Coordinates {
        let origin = self.center_world();
        let mid = self.size.center();
        projection::unproject(
            WorldPoint {
                x: origin.x + (point.x - mid.x),
                y: origin.y + (point.y - mid.y),
            },
            self.zoom,
        )
    }

    fn size(&self) -> ViewportSize {
        self.size
    }

    fn open_popup(&mut self, event_id: &str) {
        self.popups.push(event_id.to_owned());
    }
}
