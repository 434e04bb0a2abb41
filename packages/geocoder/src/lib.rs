#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location search for the site selector.
//!
//! Free-text queries are resolved to places through the Mapbox forward
//! geocoding API ([`mapbox`]), configured by the embedded TOML files in
//! `services/` ([`service_registry`]).
//!
//! [`search::LocationSearch`] sits between the search box and the
//! geocoder: it debounces keystrokes, tags each outbound request with a
//! generation token, and only applies the response of the most recently
//! issued request, whatever order responses arrive in. Selecting a result
//! flies the map viewport to it.

pub mod mapbox;
pub mod search;
pub mod service_registry;

use geofence_geometry_models::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use search::{LocationSearch, SearchSettings, SearchStatus, SearchUpdate};

/// A place returned by a location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider identifier of the place.
    pub id: String,
    /// Short name (e.g., `"Connaught Place"`).
    pub text: String,
    /// Fully qualified name (e.g., `"Connaught Place, New Delhi, Delhi, India"`).
    pub place_name: String,
    /// `[longitude, latitude]` of the place.
    pub center: Coordinate,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Geocoding service returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// A forward geocoder.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-text query to candidate places.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError>;
}
