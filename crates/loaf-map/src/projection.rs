//! Slippy-map Web-Mercator math.
//!
//! World pixel coordinates at zoom `z` span `0..TILE_SIZE * 2^z` on both
//! axes, with the origin at the north-west corner.

use std::f64::consts::PI;

use loaf_core::Coordinates;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude beyond which Web-Mercator is undefined; inputs are clamped to it.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A position in world pixels at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2.0f64.powf(zoom)
}

#[must_use]
pub fn lng_to_x(lng: f64, zoom: f64) -> f64 {
    ((lng + 180.0) / 360.0) * world_size(zoom)
}

#[must_use]
pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world_size(zoom)
}

#[must_use]
pub fn x_to_lng(x: f64, zoom: f64) -> f64 {
    (x / world_size(zoom)) * 360.0 - 180.0
}

#[must_use]
pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = PI - 2.0 * PI * y / world_size(zoom);
    n.sinh().atan().to_degrees()
}

#[must_use]
pub fn project(coords: Coordinates, zoom: f64) -> WorldPoint {
    WorldPoint {
        x: lng_to_x(coords.lng, zoom),
        y: lat_to_y(coords.lat, zoom),
    }
}

#[must_use]
pub fn unproject(point: WorldPoint, zoom: f64) -> Coordinates {
    Coordinates {
        lat: y_to_lat(point.y, zoom),
        lng: x_to_lng(point.x, zoom),
    }
}
