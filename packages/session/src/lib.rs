#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The site selector session.
//!
//! Ties one map surface, its drawing overlay, the boundary coordinator,
//! and the location search together behind [`SiteSelector`]. Startup is
//! gated on [`GeofenceConfig`] carrying a map credential; teardown releases
//! everything in a fixed order.

pub mod config;
pub mod selector;

use geofence_map::MapError;
use thiserror::Error;

pub use config::GeofenceConfig;
pub use selector::{SelectorEvent, SiteSelector};

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential is absent or blank.
    #[error("Missing credential: {name} must be set")]
    MissingCredential {
        /// Name of the environment variable.
        name: String,
    },

    /// An optional setting is present but malformed.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Errors from opening or driving a [`SiteSelector`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration was rejected before the map was touched.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The map surface or overlay failed.
    #[error(transparent)]
    Map(#[from] MapError),
}
