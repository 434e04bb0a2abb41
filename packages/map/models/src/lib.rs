#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types shared between the map surface, the drawing overlay, and the
//! components that react to them.
//!
//! The drawing overlay reports edits as [`DrawEvent`]s carrying `GeoJSON`
//! features. Viewport transitions are described by [`FlyToOptions`].

use geofence_geometry_models::Coordinate;
use geojson::Feature;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The overlay events the boundary pipeline subscribes to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DrawEventKind {
    /// A shape was completed.
    #[serde(rename = "draw.create")]
    #[strum(serialize = "draw.create")]
    Create,
    /// An existing shape was moved or reshaped.
    #[serde(rename = "draw.update")]
    #[strum(serialize = "draw.update")]
    Update,
    /// Shapes were removed.
    #[serde(rename = "draw.delete")]
    #[strum(serialize = "draw.delete")]
    Delete,
}

impl DrawEventKind {
    /// Every kind, in subscription order.
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];
}

/// An event emitted by the drawing overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// A shape was completed.
    Create {
        /// Created features; the drawn shape is first.
        features: Vec<Feature>,
    },
    /// A shape was edited.
    Update {
        /// Edited features; the edited shape is first.
        features: Vec<Feature>,
    },
    /// Shapes were removed.
    Delete {
        /// Removed features.
        features: Vec<Feature>,
    },
}

impl DrawEvent {
    /// The event's kind.
    #[must_use]
    pub const fn kind(&self) -> DrawEventKind {
        match self {
            Self::Create { .. } => DrawEventKind::Create,
            Self::Update { .. } => DrawEventKind::Update,
            Self::Delete { .. } => DrawEventKind::Delete,
        }
    }

    /// The features carried by the event.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        match self {
            Self::Create { features } | Self::Update { features } | Self::Delete { features } => {
                features
            }
        }
    }

    /// The first feature, which is the one the user drew or edited.
    #[must_use]
    pub fn primary_feature(&self) -> Option<&Feature> {
        self.features().first()
    }
}

/// Interaction modes of the drawing overlay.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawMode {
    /// Select and move whole features.
    SimpleSelect,
    /// Select and move individual vertices.
    DirectSelect,
    /// Place vertices of a new polygon.
    DrawPolygon,
    /// No interaction.
    Static,
}

/// Initial camera position of a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Center longitude.
    pub longitude: f64,
    /// Center latitude.
    pub latitude: f64,
    /// Zoom level.
    pub zoom: f64,
}

impl Default for ViewState {
    /// New Delhi at city zoom.
    fn default() -> Self {
        Self {
            longitude: 77.2090,
            latitude: 28.6139,
            zoom: 12.0,
        }
    }
}

/// An animated pan+zoom of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyToOptions {
    /// Destination center.
    pub center: Coordinate,
    /// Destination zoom level.
    pub zoom: f64,
    /// Animation speed multiplier.
    pub speed: f64,
    /// Zoom curve of the flight path.
    pub curve: f64,
    /// Whether the animation runs even when reduced motion is requested.
    pub essential: bool,
}

/// A selectable base map style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapStyle {
    /// Short identifier (e.g., `"satellite"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Style URL passed to the surface.
    pub url: String,
    /// Menu position, lower first.
    pub order: u32,
}

/// Paint settings for one overlay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayerStyle {
    /// Layer identifier.
    pub id: String,
    /// What the layer paints.
    pub target: OverlayTarget,
    /// Whether the layer applies to the feature being edited.
    pub active: bool,
    /// CSS color.
    pub color: String,
    /// Fill opacity, for fill layers.
    pub opacity: Option<f64>,
    /// Line width or circle radius in pixels.
    pub size: Option<f64>,
}

/// What an overlay layer paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTarget {
    /// Polygon interior.
    Fill,
    /// Polygon outline.
    Stroke,
    /// Vertex halo.
    VertexHalo,
    /// Vertex dot.
    Vertex,
}

/// How the drawing overlay is mounted on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Whether the overlay shows its own toolbar.
    pub display_controls_default: bool,
    /// Layer paint settings.
    pub styles: Vec<OverlayLayerStyle>,
}

const INACTIVE_COLOR: &str = "#3b82f6";
const ACTIVE_COLOR: &str = "#059669";

fn layer(
    id: &str,
    target: OverlayTarget,
    active: bool,
    color: &str,
    opacity: Option<f64>,
    size: Option<f64>,
) -> OverlayLayerStyle {
    OverlayLayerStyle {
        id: id.to_string(),
        target,
        active,
        color: color.to_string(),
        opacity,
        size,
    }
}

impl Default for OverlayConfig {
    /// Toolbar hidden; blue inactive polygons, green active polygons.
    fn default() -> Self {
        Self {
            display_controls_default: false,
            styles: vec![
                layer(
                    "gl-draw-polygon-fill-inactive",
                    OverlayTarget::Fill,
                    false,
                    INACTIVE_COLOR,
                    Some(0.1),
                    None,
                ),
                layer(
                    "gl-draw-polygon-stroke-inactive",
                    OverlayTarget::Stroke,
                    false,
                    INACTIVE_COLOR,
                    None,
                    Some(3.0),
                ),
                layer(
                    "gl-draw-polygon-fill-active",
                    OverlayTarget::Fill,
                    true,
                    ACTIVE_COLOR,
                    Some(0.1),
                    None,
                ),
                layer(
                    "gl-draw-polygon-stroke-active",
                    OverlayTarget::Stroke,
                    true,
                    ACTIVE_COLOR,
                    None,
                    Some(3.0),
                ),
                layer(
                    "gl-draw-polygon-and-line-vertex-halo-active",
                    OverlayTarget::VertexHalo,
                    true,
                    "#FFF",
                    None,
                    Some(6.0),
                ),
                layer(
                    "gl-draw-polygon-and-line-vertex-active",
                    OverlayTarget::Vertex,
                    true,
                    ACTIVE_COLOR,
                    None,
                    Some(3.0),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_event_kind_uses_overlay_names() {
        assert_eq!(DrawEventKind::Create.to_string(), "draw.create");
        assert_eq!(
            "draw.delete".parse::<DrawEventKind>().unwrap(),
            DrawEventKind::Delete
        );
        assert_eq!(
            serde_json::to_value(DrawEventKind::Update).unwrap(),
            serde_json::json!("draw.update")
        );
    }

    #[test]
    fn draw_mode_names() {
        assert_eq!(DrawMode::DrawPolygon.as_ref(), "draw_polygon");
        assert_eq!(
            "simple_select".parse::<DrawMode>().unwrap(),
            DrawMode::SimpleSelect
        );
    }

    #[test]
    fn delete_event_without_features_has_no_primary() {
        let event = DrawEvent::Delete { features: vec![] };
        assert_eq!(event.kind(), DrawEventKind::Delete);
        assert!(event.primary_feature().is_none());
    }

    #[test]
    fn default_overlay_hides_controls() {
        let config = OverlayConfig::default();
        assert!(!config.display_controls_default);
        assert_eq!(config.styles.len(), 6);
        assert!(
            config
                .styles
                .iter()
                .filter(|s| s.active && s.target != OverlayTarget::VertexHalo)
                .all(|s| s.color == ACTIVE_COLOR)
        );
    }
}
