//! Environment-driven configuration of the site selector.
//!
//! | Variable                      | Required | Format            |
//! |-------------------------------|----------|-------------------|
//! | `MAPBOX_TOKEN`                | yes      | non-blank string  |
//! | `GEOFENCE_INITIAL_VIEW`       | no       | `lng,lat,zoom`    |
//! | `GEOFENCE_SEARCH_DEBOUNCE_MS` | no       | milliseconds      |

use std::time::Duration;

use geofence_map_models::{OverlayConfig, ViewState};

use crate::ConfigError;

/// Name of the map credential variable.
pub const MAPBOX_TOKEN_VAR: &str = "MAPBOX_TOKEN";
/// Name of the initial view variable.
pub const INITIAL_VIEW_VAR: &str = "GEOFENCE_INITIAL_VIEW";
/// Name of the search debounce override variable.
pub const SEARCH_DEBOUNCE_VAR: &str = "GEOFENCE_SEARCH_DEBOUNCE_MS";

/// Settings needed to open a site selector.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceConfig {
    /// Mapbox access token, shared by the map surface and the geocoder.
    pub access_token: String,
    /// Where the map opens.
    pub initial_view: ViewState,
    /// Overrides the geocoding service's debounce interval.
    pub search_debounce: Option<Duration>,
    /// Drawing overlay paint settings.
    pub overlay: OverlayConfig,
}

impl GeofenceConfig {
    /// Creates a config with default view and overlay settings.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            initial_view: ViewState::default(),
            search_debounce: None,
            overlay: OverlayConfig::default(),
        }
    }

    /// Loads the config from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the config through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingCredential`] if `MAPBOX_TOKEN` is unset or
    ///   blank
    /// * [`ConfigError::Invalid`] if an optional variable is malformed
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup(MAPBOX_TOKEN_VAR).unwrap_or_default();
        let mut config = Self::new(token.trim());
        config.validate()?;

        if let Some(raw) = lookup(INITIAL_VIEW_VAR) {
            config.initial_view = parse_view(&raw)?;
        }

        if let Some(raw) = lookup(SEARCH_DEBOUNCE_VAR) {
            let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                message: format!("{SEARCH_DEBOUNCE_VAR}={raw:?}: {e}"),
            })?;
            config.search_debounce = Some(Duration::from_millis(ms));
        }

        Ok(config)
    }

    /// Checks that the map credential is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the token is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                name: MAPBOX_TOKEN_VAR.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_view(raw: &str) -> Result<ViewState, ConfigError> {
    let invalid = |detail: &str| ConfigError::Invalid {
        message: format!("{INITIAL_VIEW_VAR}={raw:?}: {detail}"),
    };

    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(&e.to_string()))?;

    let [longitude, latitude, zoom] = parts[..] else {
        return Err(invalid("expected lng,lat,zoom"));
    };

    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid("coordinate out of range"));
    }
    if !(0.0..=24.0).contains(&zoom) {
        return Err(invalid("zoom out of range"));
    }

    Ok(ViewState {
        longitude,
        latitude,
        zoom,
    })
}
