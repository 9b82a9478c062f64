//! Map camera choreography for focusing events.
//!
//! [`CameraController`] drives any [`MapViewport`] through a two-flight
//! focus that leaves the target two thirds down the screen, and guards
//! against replaying a focus within one map session.

pub mod controller;
pub mod correction;
pub mod focus;
pub mod projection;
pub mod viewport;

pub use controller::{CameraController, FocusOutcome, FOCUS_ZOOM};
pub use correction::{
    adjusted_center, correction, FocusAnchor, PixelDelta, ScreenPoint, ViewportSize,
};
pub use focus::FocusRequest;
pub use viewport::{MapViewport, MercatorViewport};
