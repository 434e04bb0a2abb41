#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Site boundary geometry types.
//!
//! These types describe a user-drawn polygonal site boundary after it has
//! been normalized: the outer ring, its enumerated vertices, the bounding
//! box, and the approximate area. They also define the hand-off payload
//! consumed by the downstream site editor.
//!
//! Coordinates follow the `GeoJSON` convention of `[longitude, latitude]`
//! and serialize as two-element arrays.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// A `[longitude, latitude]` pair in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude, expected in `[-180, 180]`.
    pub longitude: f64,
    /// Latitude, expected in `[-90, 90]`.
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Returns the coordinate as a `[longitude, latitude]` array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        value.to_array()
    }
}

/// An ordered sequence of coordinates bounding a polygon.
///
/// Rings drawn by the overlay are closed: the first coordinate is repeated
/// at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(pub Vec<Coordinate>);

impl Ring {
    /// Creates a ring from its coordinates.
    #[must_use]
    pub const fn new(coordinates: Vec<Coordinate>) -> Self {
        Self(coordinates)
    }

    /// The ring's coordinates in order, including any closing duplicate.
    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.0
    }

    /// Number of entries, including any closing duplicate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ring has no coordinates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the last coordinate equals the first.
    ///
    /// A single-coordinate ring is not considered closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => self.0.len() > 1 && first == last,
            _ => false,
        }
    }

    /// Returns the ring with its coordinate order reversed.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }
}

impl From<Vec<[f64; 2]>> for Ring {
    fn from(value: Vec<[f64; 2]>) -> Self {
        Self(value.into_iter().map(Coordinate::from).collect())
    }
}

/// `GeoJSON` geometry type names as reported by the drawing overlay.
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
pub enum GeometryKind {
    /// A single position.
    Point,
    /// Several positions.
    MultiPoint,
    /// An open path.
    LineString,
    /// Several open paths.
    MultiLineString,
    /// A polygon with one outer ring.
    Polygon,
    /// Several polygons.
    MultiPolygon,
    /// A heterogeneous collection of geometries.
    GeometryCollection,
}

/// The canonical geometry of a site boundary: a single outer ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryGeometry {
    kind: GeometryKind,
    /// The polygon's outer ring (closed).
    pub outer_ring: Ring,
}

impl BoundaryGeometry {
    /// Creates a polygon geometry from its outer ring.
    #[must_use]
    pub const fn polygon(outer_ring: Ring) -> Self {
        Self {
            kind: GeometryKind::Polygon,
            outer_ring,
        }
    }

    /// Always [`GeometryKind::Polygon`].
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        self.kind
    }
}

/// One enumerated boundary vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRecord {
    /// 1-based ordinal in ring order. The closing duplicate is never
    /// enumerated.
    pub index: usize,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
}

impl PointRecord {
    /// The record's position as a [`Coordinate`].
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// Axis-aligned bounds of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Minimum longitude and minimum latitude.
    pub southwest: Coordinate,
    /// Maximum longitude and maximum latitude.
    pub northeast: Coordinate,
    /// Midpoint of `southwest` and `northeast`. This is not the polygon's
    /// area centroid.
    pub center: Coordinate,
}

impl BoundingBox {
    /// Longitude extent in degrees.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.northeast.longitude - self.southwest.longitude
    }

    /// Latitude extent in degrees.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.northeast.latitude - self.southwest.latitude
    }
}

/// Approximate planar area of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMetrics {
    /// Area in square kilometers.
    pub area_km2: f64,
    /// When the area was computed.
    pub computed_at: DateTime<Utc>,
}

impl AreaMetrics {
    /// The area rounded to four decimal places, e.g. `"12321.0000"`.
    #[must_use]
    pub fn display_km2(&self) -> String {
        format!("{:.4}", self.area_km2)
    }
}

/// The single active site boundary of a session.
///
/// Every derived field is computed from `geometry` at construction time.
/// Holders share it immutably; an edit produces a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBoundary {
    /// Canonical polygon geometry.
    pub geometry: BoundaryGeometry,
    /// Enumerated vertices keyed by their 1-based index.
    pub points: BTreeMap<usize, PointRecord>,
    /// Bounds of the outer ring.
    pub bounding_box: BoundingBox,
    /// Approximate area.
    pub area: AreaMetrics,
    /// When this boundary instance was created.
    pub created_at: DateTime<Utc>,
}

impl SiteBoundary {
    /// Number of enumerated vertices.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Builds the hand-off payload for the downstream editor.
    #[must_use]
    pub fn to_handoff(&self) -> HandoffPayload {
        HandoffPayload {
            site_coordinates: self.geometry.outer_ring.clone(),
            bounding_box: self.bounding_box,
            center: self.bounding_box.center,
            kind: self.geometry.kind(),
        }
    }

    /// Builds the human-readable polygon summary.
    #[must_use]
    pub fn summary(&self) -> PolygonSummary {
        PolygonSummary {
            polygon_info: PolygonInfo {
                total_points: self.points.len(),
                geometry_type: self.geometry.kind(),
                area_km2: self.area.display_km2(),
                created_at: self.created_at,
            },
            points: SummaryPoints(self.points.values().copied().collect()),
        }
    }
}

/// Navigation state handed to the downstream site editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    /// The boundary's outer ring, closed.
    pub site_coordinates: Ring,
    /// Bounds of the ring.
    pub bounding_box: BoundingBox,
    /// Bounding-box midpoint.
    pub center: Coordinate,
    /// Geometry type name (`"Polygon"`).
    pub kind: GeometryKind,
}

/// Summary of a boundary in the `polygon_info` / `points` layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonSummary {
    /// Aggregate information.
    pub polygon_info: PolygonInfo,
    /// Vertices keyed `point-1`, `point-2`, ...
    pub points: SummaryPoints,
}

/// Aggregate section of a [`PolygonSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonInfo {
    /// Vertex count, excluding the closing duplicate.
    pub total_points: usize,
    /// Geometry type name.
    pub geometry_type: GeometryKind,
    /// Area in km² with four decimals.
    pub area_km2: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Ordered vertex map of a [`PolygonSummary`].
///
/// Serialized as an object whose keys keep ring order (`point-10` after
/// `point-9`).
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPoints(pub Vec<PointRecord>);

#[derive(Serialize)]
struct SummaryPoint {
    longitude: f64,
    latitude: f64,
    coordinates: [f64; 2],
}

impl Serialize for SummaryPoints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for point in &self.0 {
            map.serialize_entry(
                &format!("point-{}", point.index),
                &SummaryPoint {
                    longitude: point.longitude,
                    latitude: point.latitude,
                    coordinates: [point.longitude, point.latitude],
                },
            )?;
        }
        map.end()
    }
}
