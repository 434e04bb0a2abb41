#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The session's single active site boundary.
//!
//! [`coordinator::DrawCoordinator`] consumes drawing-overlay events,
//! validates the drawn polygon, derives its metrics, and replaces the
//! [`state::SiteBoundaryState`] slot wholesale. It is the slot's only
//! writer; the UI and the hand-off builder read snapshots.

pub mod coordinator;
pub mod state;

use geofence_geometry::GeometryError;
use thiserror::Error;

pub use coordinator::{DrawCoordinator, DrawState, Transition};
pub use state::SiteBoundaryState;

/// Errors surfaced by boundary operations.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// A hand-off was requested before any boundary was drawn.
    #[error("No site boundary has been drawn")]
    NotReady,

    /// The drawn feature cannot become a site boundary.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
}
