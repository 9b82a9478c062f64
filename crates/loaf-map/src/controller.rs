use std::collections::HashSet;

use loaf_core::{Coordinates, MapEvent};

use crate::correction::{adjusted_center, FocusAnchor};
use crate::focus::FocusRequest;
use crate::viewport::MapViewport;

/// Zoom level both focus flights use.
pub const FOCUS_ZOOM: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The camera flew to the event and its popup was opened.
    Focused,
    /// The id was focused earlier in this session; nothing happened.
    AlreadyFocused,
    /// No loaded event has the id; nothing happened.
    NotFound,
}

/// Moves the camera onto map events.
///
/// One controller lives for one map session. It remembers which ids it has
/// focused so that re-rendering the page with the same deep link does not
/// replay the flight.
#[derive(Debug, Clone)]
pub struct CameraController {
    anchor: FocusAnchor,
    zoom: f64,
    focused: HashSet<String>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    #[must_use]
    pub fn new() -> Self {
        Self::with_anchor(FocusAnchor::default(), FOCUS_ZOOM)
    }

    #[must_use]
    pub fn with_anchor(anchor: FocusAnchor, zoom: f64) -> Self {
        Self {
            anchor,
            zoom,
            focused: HashSet::new(),
        }
    }

    /// Flies so `target` ends up on the focus anchor, then calls `on_arrived`.
    ///
    /// The first flight centers the target; the second shifts the center by
    /// the remaining pixel error, measured on the real render. Runs to
    /// completion once started.
    pub async fn fly_to_focus<V, F>(&self, viewport: &mut V, target: Coordinates, on_arrived: F)
    where
        V: MapViewport,
        F: FnOnce(&mut V),
    {
        viewport.fly_to(target, self.zoom).await;

        let actual = viewport.project(target);
        let center_px = adjusted_center(viewport.size(), actual, &self.anchor);
        let center = viewport.unproject(center_px);
        tracing::debug!(
            dx = center_px.x - viewport.size().center().x,
            dy = center_px.y - viewport.size().center().y,
            "correcting focus position"
        );

        viewport.fly_to(center, self.zoom).await;
        on_arrived(viewport);
    }

    /// Focuses the event with `id` and opens its popup, once per session.
    ///
    /// An id that matches no event is logged and left unmarked, so it can
    /// still be focused after more events load.
    pub async fn focus_by_id<V: MapViewport>(
        &mut self,
        viewport: &mut V,
        events: &[MapEvent],
        id: &str,
    ) -> FocusOutcome {
        if self.focused.contains(id) {
            tracing::debug!(%id, "focus already applied this session");
            return FocusOutcome::AlreadyFocused;
        }
        let Some(event) = events.iter().find(|e| e.id == id) else {
            tracing::warn!(%id, loaded = events.len(), "focus target not among loaded events");
            return FocusOutcome::NotFound;
        };

        self.focused.insert(id.to_owned());
        tracing::info!(%id, source_table = %event.source_table, "focusing event");
        self.fly_to_focus(viewport, event.coordinates(), |v| v.open_popup(&event.id))
            .await;
        FocusOutcome::Focused
    }

    pub async fn apply<V: MapViewport>(
        &mut self,
        viewport: &mut V,
        events: &[MapEvent],
        request: &FocusRequest,
    ) -> FocusOutcome {
        self.focus_by_id(viewport, events, &request.target_id).await
    }

    #[must_use]
    pub fn has_focused(&self, id: &str) -> bool {
        self.focused.contains(id)
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
