//! Compile-time registry of base map styles.
//!
//! Each style is defined in a TOML file under `styles/`. The registry
//! embeds these at compile time and exposes them via [`all_styles`] and
//! [`find_style`].

use geofence_map_models::MapStyle;

/// Identifier of the style a new session starts with.
pub const DEFAULT_STYLE_ID: &str = "streets";

// ── Compile-time embedded TOML files ────────────────────────────────

const STYLE_TOMLS: &[(&str, &str)] = &[
    ("streets", include_str!("../styles/streets.toml")),
    ("standard", include_str!("../styles/standard.toml")),
    ("satellite", include_str!("../styles/satellite.toml")),
    (
        "satellite_streets",
        include_str!("../styles/satellite_streets.toml"),
    ),
    ("standard_dark", include_str!("../styles/standard_dark.toml")),
];

#[cfg(test)]
const EXPECTED_STYLE_COUNT: usize = 5;

/// Returns all map styles sorted by menu order.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_styles() -> Vec<MapStyle> {
    let mut styles: Vec<MapStyle> = STYLE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse map style '{name}': {e}"))
        })
        .collect();
    styles.sort_by_key(|s| s.order);
    styles
}

/// Looks up a style by its identifier.
#[must_use]
pub fn find_style(id: &str) -> Option<MapStyle> {
    all_styles().into_iter().find(|s| s.id == id)
}
