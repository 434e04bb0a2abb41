//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding service is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`default_service`].

use std::time::Duration;

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"mapbox"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Forward geocoding endpoint; the query is appended as a path segment.
    pub base_url: String,
    /// Maximum number of results per query.
    pub limit: u32,
    /// ISO country code used to filter results.
    pub country: String,
    /// Quiet period after the last keystroke before a query is sent.
    pub debounce_ms: u64,
    /// Viewport transition used when a result is selected.
    pub fly_to: FlyToSettings,
}

/// Zoom and easing of the flight to a selected result.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FlyToSettings {
    /// Destination zoom level.
    pub zoom: f64,
    /// Animation speed multiplier.
    pub speed: f64,
    /// Zoom curve of the flight path.
    pub curve: f64,
}

impl GeocodingService {
    /// The debounce interval as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("mapbox", include_str!("../services/mapbox.toml"))];

/// Identifier of the service used for location search.
pub const DEFAULT_SERVICE_ID: &str = "mapbox";

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all geocoding service configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns the service used for location search.
///
/// # Panics
///
/// Panics if the embedded registry has no service with
/// [`DEFAULT_SERVICE_ID`].
#[must_use]
pub fn default_service() -> GeocodingService {
    all_services()
        .into_iter()
        .find(|s| s.id == DEFAULT_SERVICE_ID)
        .unwrap_or_else(|| panic!("Geocoding service '{DEFAULT_SERVICE_ID}' is not registered"))
}
