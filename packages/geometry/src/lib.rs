#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry derivation for user-drawn site boundaries.
//!
//! Turns the outer ring of a drawn polygon into the derived fields of a
//! [`SiteBoundary`]:
//!
//! - [`metrics::compute_area`]: planar shoelace area on raw degrees,
//!   scaled by 111 km per degree. This is an approximation; accuracy
//!   degrades for large extents and at high latitude.
//! - [`metrics::compute_bounding_box`]: min/max bounds with the corner
//!   midpoint as `center`.
//! - [`metrics::enumerate_points`]: 1-based vertex records without the
//!   closing duplicate.
//!
//! The [`feature`] module normalizes `GeoJSON` features emitted by the
//! drawing overlay into a [`BoundaryGeometry`].
//!
//! [`SiteBoundary`]: geofence_geometry_models::SiteBoundary
//! [`BoundaryGeometry`]: geofence_geometry_models::BoundaryGeometry

pub mod feature;
pub mod metrics;

use geofence_geometry_models::GeometryKind;
use thiserror::Error;

pub use feature::{
    boundary_from_feature, boundary_from_geojson_str, boundary_from_geometry, feature_from_geojson_str,
    feature_from_json_value,
};
pub use metrics::{
    KM_PER_DEGREE, compute_area, compute_bounding_box, derive_site_boundary, distinct_vertex_count,
    enumerate_points, validate_ring,
};

/// Minimum number of distinct vertices a ring needs to bound an area.
pub const MIN_DISTINCT_VERTICES: usize = 3;

/// Minimum number of ring entries, closing duplicate included.
pub const MIN_CLOSED_RING_LEN: usize = 4;

/// Reasons a drawn feature cannot become a site boundary.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The feature's geometry is not a polygon.
    #[error("Expected a Polygon geometry, got {kind}")]
    NotPolygon {
        /// The geometry type that was received.
        kind: GeometryKind,
    },

    /// The feature carries no geometry at all.
    #[error("Feature has no geometry")]
    MissingGeometry,

    /// The outer ring has too few distinct vertices to bound an area.
    #[error("Ring has {distinct} distinct vertices, need at least {MIN_DISTINCT_VERTICES}")]
    Degenerate {
        /// Number of distinct vertices found.
        distinct: usize,
    },

    /// The ring does not end on its first coordinate, or has fewer than
    /// four entries.
    #[error("Ring with {entries} entries is not closed")]
    NotClosed {
        /// Number of entries in the ring.
        entries: usize,
    },

    /// A coordinate is non-finite or outside the WGS84 ranges.
    #[error("Coordinate {index} out of range: [{longitude}, {latitude}]")]
    OutOfRange {
        /// 0-based position in the ring.
        index: usize,
        /// Offending longitude.
        longitude: f64,
        /// Offending latitude.
        latitude: f64,
    },

    /// `GeoJSON` input could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Formats a position as `"lat, lng"` with six decimals each.
#[must_use]
pub fn format_coordinates(longitude: f64, latitude: f64) -> String {
    format!("{latitude:.6}, {longitude:.6}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_latitude_first() {
        assert_eq!(format_coordinates(77.209, 28.6139), "28.613900, 77.209000");
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = GeometryError::NotPolygon {
            kind: GeometryKind::LineString,
        };
        assert_eq!(err.to_string(), "Expected a Polygon geometry, got LineString");

        let err = GeometryError::Degenerate { distinct: 2 };
        assert_eq!(
            err.to_string(),
            "Ring has 2 distinct vertices, need at least 3"
        );
    }
}
