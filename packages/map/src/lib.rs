#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map session management.
//!
//! The map surface and its polygon drawing overlay are host-provided
//! widgets. This crate abstracts them behind the [`surface::MapSurface`]
//! and [`surface::DrawOverlay`] capability traits and owns their lifecycle
//! through [`session::MapSession`], the handle passed to every component
//! that needs the map. Base map styles are loaded from the embedded
//! [`styles`] registry.

pub mod recording;
pub mod session;
pub mod styles;
pub mod surface;

use thiserror::Error;

pub use session::{DrawEventStream, MapSession};
pub use surface::{DrawEventSink, DrawOverlay, MapSurface, SubscriptionId, Viewport};

/// Errors from map session operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// The session was already torn down.
    #[error("Map session already torn down")]
    AlreadyTornDown,

    /// The drawing overlay could not be mounted or subscribed to.
    #[error("Overlay error: {message}")]
    Overlay {
        /// Description of the failure.
        message: String,
    },

    /// No map style has the requested identifier.
    #[error("Unknown map style: {id}")]
    UnknownStyle {
        /// The requested identifier.
        id: String,
    },
}
