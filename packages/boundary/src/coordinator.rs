//! State machine over drawing-overlay events.
//!
//! ```text
//! Idle   --create(polygon)--> Active
//! Active --update(polygon)--> Active   (boundary replaced wholesale)
//! Active --delete-----------> Idle
//! any    --restart_draw-----> Idle
//! ```
//!
//! A feature that is not a polygon, or whose ring has fewer than three
//! distinct vertices, is rejected and leaves the state untouched.
//! Self-intersecting polygons are accepted as drawn.

use geofence_geometry::{GeometryError, boundary_from_feature, derive_site_boundary};
use geofence_geometry_models::SiteBoundary;
use geofence_map_models::DrawEvent;
use geojson::Feature;

use crate::state::SiteBoundaryState;

/// Whether a boundary is currently present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// No boundary.
    Idle,
    /// Exactly one boundary.
    Active,
}

/// Outcome of feeding one event to the coordinator.
#[derive(Debug)]
pub enum Transition {
    /// A new boundary became active.
    Created,
    /// The active boundary was replaced.
    Replaced,
    /// The boundary was removed.
    Cleared,
    /// The event required no change (e.g., delete while idle).
    Unchanged,
    /// The feature was invalid; the state did not change.
    Rejected(GeometryError),
}

/// Turns overlay events into site boundary state.
#[derive(Debug, Default)]
pub struct DrawCoordinator {
    state: SiteBoundaryState,
}

impl DrawCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SiteBoundaryState::new(),
        }
    }

    /// The current state.
    #[must_use]
    pub const fn draw_state(&self) -> DrawState {
        if self.state.is_empty() {
            DrawState::Idle
        } else {
            DrawState::Active
        }
    }

    /// Read access to the boundary slot.
    #[must_use]
    pub const fn boundary(&self) -> &SiteBoundaryState {
        &self.state
    }

    /// Applies one overlay event.
    pub fn handle(&mut self, event: &DrawEvent) -> Transition {
        match event {
            DrawEvent::Create { .. } | DrawEvent::Update { .. } => {
                let Some(feature) = event.primary_feature() else {
                    log::warn!("Ignoring {} event without features", event.kind());
                    return Transition::Rejected(GeometryError::MissingGeometry);
                };
                if matches!(event, DrawEvent::Create { .. }) {
                    self.create(feature)
                } else {
                    self.update(feature)
                }
            }
            DrawEvent::Delete { .. } => self.delete(),
        }
    }

    /// Handles a completed shape.
    pub fn create(&mut self, feature: &Feature) -> Transition {
        self.apply(feature)
    }

    /// Handles an edited shape. Treated as a create when idle.
    pub fn update(&mut self, feature: &Feature) -> Transition {
        if self.draw_state() == DrawState::Idle {
            log::debug!("Update received while idle; treating as create");
        }
        self.apply(feature)
    }

    /// Handles removal of the drawn shape.
    pub fn delete(&mut self) -> Transition {
        if self.state.is_empty() {
            return Transition::Unchanged;
        }
        self.state.clear();
        log::info!("Site boundary deleted");
        Transition::Cleared
    }

    /// Resets to idle before a new draw interaction begins.
    pub fn restart_draw(&mut self) -> Transition {
        let was_active = !self.state.is_empty();
        self.state.clear();
        log::debug!("Draw restarted (previous boundary: {was_active})");
        if was_active {
            Transition::Cleared
        } else {
            Transition::Unchanged
        }
    }

    fn apply(&mut self, feature: &Feature) -> Transition {
        let boundary = match derive(feature) {
            Ok(boundary) => boundary,
            Err(e) => {
                log::warn!("Invalid geometry ignored: {e}");
                return Transition::Rejected(e);
            }
        };

        log_boundary(feature, &boundary);

        let transition = match self.draw_state() {
            DrawState::Idle => Transition::Created,
            DrawState::Active => Transition::Replaced,
        };
        self.state.replace(boundary);
        transition
    }
}

fn derive(feature: &Feature) -> Result<SiteBoundary, GeometryError> {
    derive_site_boundary(boundary_from_feature(feature)?)
}

fn log_boundary(feature: &Feature, boundary: &SiteBoundary) {
    let bbox = &boundary.bounding_box;
    log::info!(
        "Site boundary {}: {} points, {} km²",
        feature
            .id
            .as_ref()
            .map_or_else(|| "(no id)".to_string(), |id| format!("{id:?}")),
        boundary.point_count(),
        boundary.area.display_km2(),
    );
    log::debug!(
        "Bounding box sw [{}, {}] ne [{}, {}] center [{}, {}], {:.6} x {:.6} deg",
        bbox.southwest.longitude,
        bbox.southwest.latitude,
        bbox.northeast.longitude,
        bbox.northeast.latitude,
        bbox.center.longitude,
        bbox.center.latitude,
        bbox.width(),
        bbox.height(),
    );
    if log::log_enabled!(log::Level::Debug) {
        match serde_json::to_string_pretty(&boundary.summary()) {
            Ok(json) => log::debug!("Polygon summary:\n{json}"),
            Err(e) => log::debug!("Polygon summary unavailable: {e}"),
        }
    }
}
