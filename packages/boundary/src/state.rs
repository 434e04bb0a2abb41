//! The read-mostly slot holding the current site boundary.

use std::sync::Arc;

use geofence_geometry_models::{HandoffPayload, PolygonSummary, SiteBoundary};

use crate::BoundaryError;

/// Holds the current [`SiteBoundary`], or nothing.
///
/// The boundary is shared as an immutable [`Arc`]. Writes replace the whole
/// value, so a snapshot taken by a reader never changes underneath it.
#[derive(Debug, Default)]
pub struct SiteBoundaryState {
    current: Option<Arc<SiteBoundary>>,
}

impl SiteBoundaryState {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The current boundary, if any.
    #[must_use]
    pub fn current_snapshot(&self) -> Option<Arc<SiteBoundary>> {
        self.current.clone()
    }

    /// Whether no boundary is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Summary of the current boundary, if any.
    #[must_use]
    pub fn summary(&self) -> Option<PolygonSummary> {
        self.current.as_deref().map(SiteBoundary::summary)
    }

    /// Assembles the payload for the downstream site editor.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::NotReady`] if no boundary is present.
    pub fn build_handoff_payload(&self) -> Result<HandoffPayload, BoundaryError> {
        let boundary = self.current.as_deref().ok_or(BoundaryError::NotReady)?;
        let payload = boundary.to_handoff();

        log::info!(
            "Hand-off payload: {} ring coordinates, center [{}, {}], kind {}",
            payload.site_coordinates.len(),
            payload.center.longitude,
            payload.center.latitude,
            payload.kind,
        );

        Ok(payload)
    }

    pub(crate) fn replace(&mut self, boundary: SiteBoundary) {
        self.current = Some(Arc::new(boundary));
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
    }
}
