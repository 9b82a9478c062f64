//! Screen-space math for the second leg of a focus flight.
//!
//! After the first flight the target sits at (roughly) the viewport center.
//! Moving the map center by a pixel vector `v` moves every rendered point by
//! `-v`, so to bring the target from where it rendered (`A`) to where it
//! should be (`D`) the center moves by `A - D`.

/// A position in viewport pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn offset(self, delta: PixelDelta) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelDelta {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    #[must_use]
    pub fn center(self) -> ScreenPoint {
        ScreenPoint {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }
}

/// Where a focused marker should end up on screen.
///
/// The default puts it two thirds of the way down and 10 px right of the
/// horizontal center, leaving room for the popup above it and clear of the
/// filter bar docked at the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusAnchor {
    pub vertical_fraction: f64,
    pub horizontal_offset_px: f64,
}

impl Default for FocusAnchor {
    fn default() -> Self {
        Self {
            vertical_fraction: 2.0 / 3.0,
            horizontal_offset_px: 10.0,
        }
    }
}

impl FocusAnchor {
    #[must_use]
    pub fn desired_position(&self, size: ViewportSize) -> ScreenPoint {
        ScreenPoint {
            x: size.width / 2.0 + self.horizontal_offset_px,
            y: size.height * self.vertical_fraction,
        }
    }
}

/// Pixel vector the map center must move by so the target at `actual`
/// lands on the anchor.
#[must_use]
pub fn correction(size: ViewportSize, actual: ScreenPoint, anchor: &FocusAnchor) -> PixelDelta {
    let desired = anchor.desired_position(size);
    PixelDelta {
        dx: actual.x - desired.x,
        dy: actual.y - desired.y,
    }
}

/// Screen position of the new map center for the second flight.
#[must_use]
pub fn adjusted_center(size: ViewportSize, actual: ScreenPoint, anchor: &FocusAnchor) -> ScreenPoint {
    size.center().offset(correction(size, actual, anchor))
}
