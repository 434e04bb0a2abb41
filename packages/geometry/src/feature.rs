//! Normalization of drawing-overlay `GeoJSON` into [`BoundaryGeometry`].
//!
//! The overlay reports polygons as `GeoJSON` features whose coordinates
//! are a list of rings. Only the outer (first) ring is kept; holes are not
//! supported.

use geofence_geometry_models::{BoundaryGeometry, Coordinate, GeometryKind, Ring};
use geojson::{Feature, GeoJson, Geometry, Value};

use crate::GeometryError;

/// Maps a `GeoJSON` geometry value to its type name.
#[must_use]
pub const fn geometry_kind(value: &Value) -> GeometryKind {
    match value {
        Value::Point(_) => GeometryKind::Point,
        Value::MultiPoint(_) => GeometryKind::MultiPoint,
        Value::LineString(_) => GeometryKind::LineString,
        Value::MultiLineString(_) => GeometryKind::MultiLineString,
        Value::Polygon(_) => GeometryKind::Polygon,
        Value::MultiPolygon(_) => GeometryKind::MultiPolygon,
        Value::GeometryCollection(_) => GeometryKind::GeometryCollection,
    }
}

/// Extracts the polygon boundary from a drawn feature.
///
/// Only the polygon kind and coordinate shape are checked here; vertex
/// count and range checks happen during derivation.
///
/// # Errors
///
/// * [`GeometryError::MissingGeometry`] if the feature has no geometry
/// * [`GeometryError::NotPolygon`] if the geometry is any other kind
/// * [`GeometryError::Parse`] if the polygon has no rings or a position
///   has fewer than two components
pub fn boundary_from_feature(feature: &Feature) -> Result<BoundaryGeometry, GeometryError> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or(GeometryError::MissingGeometry)?;
    boundary_from_geometry(geometry)
}

/// Extracts the polygon boundary from a bare `GeoJSON` geometry.
///
/// # Errors
///
/// See [`boundary_from_feature`].
pub fn boundary_from_geometry(geometry: &Geometry) -> Result<BoundaryGeometry, GeometryError> {
    let Value::Polygon(rings) = &geometry.value else {
        return Err(GeometryError::NotPolygon {
            kind: geometry_kind(&geometry.value),
        });
    };

    let Some(outer) = rings.first() else {
        return Err(GeometryError::Parse {
            message: "Polygon has no rings".to_string(),
        });
    };

    if rings.len() > 1 {
        log::debug!("Ignoring {} interior ring(s)", rings.len() - 1);
    }

    let coordinates = outer
        .iter()
        .enumerate()
        .map(|(i, position)| match (position.first(), position.get(1)) {
            (Some(&lng), Some(&lat)) => Ok(Coordinate::new(lng, lat)),
            _ => Err(GeometryError::Parse {
                message: format!("Position {i} has fewer than 2 components"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BoundaryGeometry::polygon(Ring::new(coordinates)))
}

/// Parses a `GeoJSON` document into the feature it describes.
///
/// Accepts a `Feature`, a bare `Geometry` (wrapped into a feature), or a
/// `FeatureCollection` (the first feature is used).
///
/// # Errors
///
/// Returns [`GeometryError::Parse`] if the text is not valid `GeoJSON` or
/// a collection is empty.
pub fn feature_from_geojson_str(text: &str) -> Result<Feature, GeometryError> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| GeometryError::Parse {
        message: e.to_string(),
    })?;

    match geojson {
        GeoJson::Feature(feature) => Ok(feature),
        GeoJson::Geometry(geometry) => Ok(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }),
        GeoJson::FeatureCollection(collection) => {
            collection
                .features
                .into_iter()
                .next()
                .ok_or_else(|| GeometryError::Parse {
                    message: "FeatureCollection is empty".to_string(),
                })
        }
    }
}

/// Parses a `GeoJSON` document and extracts its polygon boundary.
///
/// # Errors
///
/// See [`feature_from_geojson_str`] and [`boundary_from_feature`].
pub fn boundary_from_geojson_str(text: &str) -> Result<BoundaryGeometry, GeometryError> {
    boundary_from_feature(&feature_from_geojson_str(text)?)
}

/// Parses a JSON value into a `GeoJSON` feature.
///
/// # Errors
///
/// Returns [`GeometryError::Parse`] if the value is not a `GeoJSON`
/// feature.
pub fn feature_from_json_value(value: serde_json::Value) -> Result<Feature, GeometryError> {
    match GeoJson::from_json_value(value) {
        Ok(GeoJson::Feature(feature)) => Ok(feature),
        Ok(_) => Err(GeometryError::Parse {
            message: "Expected a GeoJSON Feature".to_string(),
        }),
        Err(e) => Err(GeometryError::Parse {
            message: e.to_string(),
        }),
    }
}
