//! Area, bounding box, and point enumeration for a boundary ring.
//!
//! All functions here are pure. Area is orientation-independent: a ring
//! and its reversal yield the same magnitude.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use geo::{BoundingRect, Coord, LineString};
use geofence_geometry_models::{
    AreaMetrics, BoundaryGeometry, BoundingBox, Coordinate, PointRecord, Ring, SiteBoundary,
};

use crate::{GeometryError, MIN_CLOSED_RING_LEN, MIN_DISTINCT_VERTICES};

/// Rough kilometers per degree used to scale square degrees to km².
pub const KM_PER_DEGREE: f64 = 111.0;

fn to_line_string(ring: &Ring) -> LineString<f64> {
    LineString::new(
        ring.coordinates()
            .iter()
            .map(|c| Coord {
                x: c.longitude,
                y: c.latitude,
            })
            .collect(),
    )
}

/// Counts coordinate-distinct vertices in the ring.
///
/// The closing duplicate never adds to the count. `-0.0` and `0.0` are
/// treated as the same value.
#[must_use]
pub fn distinct_vertex_count(ring: &Ring) -> usize {
    ring.coordinates()
        .iter()
        .map(|c| ((c.longitude + 0.0).to_bits(), (c.latitude + 0.0).to_bits()))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Computes the approximate area of the ring in km².
///
/// Uses the planar shoelace formula on raw degree coordinates, summed over
/// consecutive vertex pairs from the first to the last entry, and scaled
/// by `KM_PER_DEGREE²`. The sum does not wrap around, so a closed ring
/// supplies its own closing edge. Rings with fewer than three distinct
/// vertices have area 0.
#[must_use]
pub fn compute_area(ring: &Ring) -> f64 {
    if distinct_vertex_count(ring) < MIN_DISTINCT_VERTICES {
        return 0.0;
    }

    let twice_area: f64 = to_line_string(ring)
        .lines()
        .map(|line| line.start.x * line.end.y - line.end.x * line.start.y)
        .sum();

    0.5 * twice_area.abs() * KM_PER_DEGREE * KM_PER_DEGREE
}

/// Computes the component-wise bounds of the ring.
///
/// `center` is the midpoint of the two extreme corners, not the polygon's
/// centroid. Returns `None` for an empty ring.
#[must_use]
pub fn compute_bounding_box(ring: &Ring) -> Option<BoundingBox> {
    let rect = to_line_string(ring).bounding_rect()?;
    let center = rect.center();

    Some(BoundingBox {
        southwest: Coordinate::new(rect.min().x, rect.min().y),
        northeast: Coordinate::new(rect.max().x, rect.max().y),
        center: Coordinate::new(center.x, center.y),
    })
}

/// Enumerates the ring's vertices with 1-based indices.
///
/// If the final coordinate equals the first it is the closing duplicate
/// and is dropped.
#[must_use]
pub fn enumerate_points(ring: &Ring) -> Vec<PointRecord> {
    let coordinates = ring.coordinates();
    let take = if ring.is_closed() {
        coordinates.len() - 1
    } else {
        coordinates.len()
    };

    coordinates[..take]
        .iter()
        .enumerate()
        .map(|(i, c)| PointRecord {
            index: i + 1,
            longitude: c.longitude,
            latitude: c.latitude,
        })
        .collect()
}

/// Checks that the ring can bound a site.
///
/// # Errors
///
/// * [`GeometryError::OutOfRange`] if any coordinate is non-finite or
///   outside the WGS84 ranges
/// * [`GeometryError::Degenerate`] if fewer than three distinct vertices
///   remain
/// * [`GeometryError::NotClosed`] if the last entry does not repeat the
///   first, or the ring has fewer than four entries
pub fn validate_ring(ring: &Ring) -> Result<(), GeometryError> {
    if let Some((index, c)) = ring
        .coordinates()
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_valid())
    {
        return Err(GeometryError::OutOfRange {
            index,
            longitude: c.longitude,
            latitude: c.latitude,
        });
    }

    let distinct = distinct_vertex_count(ring);
    if distinct < MIN_DISTINCT_VERTICES {
        return Err(GeometryError::Degenerate { distinct });
    }

    if !ring.is_closed() || ring.len() < MIN_CLOSED_RING_LEN {
        return Err(GeometryError::NotClosed {
            entries: ring.len(),
        });
    }

    Ok(())
}

/// Validates the geometry and derives a complete [`SiteBoundary`] from it.
///
/// Every derived field is computed here, from `geometry.outer_ring` alone.
///
/// # Errors
///
/// Returns [`GeometryError`] if the ring fails [`validate_ring`].
pub fn derive_site_boundary(geometry: BoundaryGeometry) -> Result<SiteBoundary, GeometryError> {
    let ring = &geometry.outer_ring;
    validate_ring(ring)?;

    let bounding_box = compute_bounding_box(ring).ok_or(GeometryError::Degenerate { distinct: 0 })?;
    let now = Utc::now();
    let area = AreaMetrics {
        area_km2: compute_area(ring),
        computed_at: now,
    };
    let points: BTreeMap<usize, PointRecord> = enumerate_points(ring)
        .into_iter()
        .map(|p| (p.index, p))
        .collect();

    log::debug!(
        "Derived boundary: {} points, {} km², bbox {:.6}x{:.6}",
        points.len(),
        area.display_km2(),
        bounding_box.width(),
        bounding_box.height(),
    );

    Ok(SiteBoundary {
        geometry,
        points,
        bounding_box,
        area,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Ring {
        Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
    }

    fn delhi_site() -> Ring {
        Ring::from(vec![
            [77.2010, 28.6100],
            [77.2150, 28.6090],
            [77.2190, 28.6180],
            [77.2080, 28.6230],
            [77.1990, 28.6170],
            [77.2010, 28.6100],
        ])
    }

    #[test]
    fn unit_square_area() {
        let area = compute_area(&square());
        assert!((area - 12_321.0).abs() < 1e-6, "area was {area}");
    }

    #[test]
    fn area_is_orientation_independent() {
        for ring in [square(), delhi_site()] {
            let forward = compute_area(&ring);
            let backward = compute_area(&ring.reversed());
            assert!(forward >= 0.0);
            assert!((forward - backward).abs() < 1e-9);
        }
    }

    #[test]
    fn triangle_area() {
        let ring = Ring::from(vec![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]);
        assert!((compute_area(&ring) - 2.0 * 12_321.0).abs() < 1e-6);
    }

    #[test]
    fn open_ring_area_has_no_wraparound_edge() {
        // 0.5 * |(1*1 - 3*1) + (3*3 - 1*1)| = 3 deg²
        let open = Ring::from(vec![[1.0, 1.0], [3.0, 1.0], [1.0, 3.0]]);
        assert!((compute_area(&open) - 3.0 * 12_321.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_rings_have_zero_area() {
        let line = Ring::from(vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(compute_area(&line).abs() < f64::EPSILON);
        assert!(compute_area(&Ring::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn unit_square_bounding_box() {
        let bbox = compute_bounding_box(&square()).unwrap();
        assert_eq!(bbox.southwest, Coordinate::new(0.0, 0.0));
        assert_eq!(bbox.northeast, Coordinate::new(1.0, 1.0));
        assert_eq!(bbox.center, Coordinate::new(0.5, 0.5));
    }

    #[test]
    fn bounding_box_corners_are_ordered() {
        for ring in [square(), square().reversed(), delhi_site()] {
            let bbox = compute_bounding_box(&ring).unwrap();
            assert!(bbox.southwest.longitude <= bbox.northeast.longitude);
            assert!(bbox.southwest.latitude <= bbox.northeast.latitude);
        }
    }

    #[test]
    fn center_is_corner_midpoint_not_centroid() {
        // An L-shaped ring whose area centroid is far from the bbox midpoint.
        let ring = Ring::from(vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 1.0],
            [1.0, 1.0],
            [1.0, 4.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ]);
        let bbox = compute_bounding_box(&ring).unwrap();
        assert_eq!(bbox.center, Coordinate::new(2.0, 2.0));
    }

    #[test]
    fn empty_ring_has_no_bounding_box() {
        assert!(compute_bounding_box(&Ring::default()).is_none());
    }

    #[test]
    fn enumerates_square_without_closing_duplicate() {
        let points = enumerate_points(&square());
        assert_eq!(points.len(), 4);
        assert_eq!(
            points.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(points[2].coordinate(), Coordinate::new(1.0, 1.0));
    }

    #[test]
    fn closed_ring_enumerates_len_minus_one() {
        let ring = delhi_site();
        assert_eq!(enumerate_points(&ring).len(), ring.len() - 1);
    }

    #[test]
    fn open_ring_keeps_every_vertex() {
        let open = Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        assert_eq!(enumerate_points(&open).len(), 3);
    }

    #[test]
    fn distinct_count_ignores_closing_duplicate_and_signed_zero() {
        assert_eq!(distinct_vertex_count(&square()), 4);
        let ring = Ring::from(vec![[0.0, 0.0], [-0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert_eq!(distinct_vertex_count(&ring), 2);
    }

    #[test]
    fn validation_rejects_degenerate_and_out_of_range() {
        let two = Ring::from(vec![[0.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(matches!(
            validate_ring(&two),
            Err(GeometryError::Degenerate { distinct: 2 })
        ));

        let bad = Ring::from(vec![[0.0, 0.0], [0.0, 95.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(matches!(
            validate_ring(&bad),
            Err(GeometryError::OutOfRange { index: 1, .. })
        ));

        assert!(validate_ring(&square()).is_ok());
    }

    #[test]
    fn validation_rejects_open_rings() {
        let open = Ring::from(vec![[1.0, 1.0], [3.0, 1.0], [1.0, 3.0]]);
        assert!(matches!(
            validate_ring(&open),
            Err(GeometryError::NotClosed { entries: 3 })
        ));

        let open_square = Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        assert!(matches!(
            validate_ring(&open_square),
            Err(GeometryError::NotClosed { entries: 4 })
        ));

        assert!(derive_site_boundary(BoundaryGeometry::polygon(open)).is_err());
    }

    #[test]
    fn derives_complete_boundary() {
        let boundary = derive_site_boundary(BoundaryGeometry::polygon(square())).unwrap();
        assert_eq!(boundary.point_count(), 4);
        assert_eq!(boundary.points[&1].coordinate(), Coordinate::new(0.0, 0.0));
        assert_eq!(boundary.bounding_box.center, Coordinate::new(0.5, 0.5));
        assert_eq!(boundary.area.display_km2(), "12321.0000");
        assert_eq!(boundary.area.computed_at, boundary.created_at);
    }

    #[test]
    fn derive_rejects_degenerate_ring() {
        let ring = Ring::from(vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(derive_site_boundary(BoundaryGeometry::polygon(ring)).is_err());
    }
}
