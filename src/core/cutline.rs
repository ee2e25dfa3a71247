//! Cutline inspection and repair.
//!
//! A cutline is a GeoJSON FeatureCollection (or bare Feature/geometry) in the
//! target CRS. Before a warp it is classified as usable, empty or invalid so
//! that failures are reported by kind rather than by a tool's error text.
use std::path::Path;

use gdal::vector::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::{Map, Value};
use tracing::warn;

use crate::io::GdalError;

/// Result of inspecting a cutline file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutlineStatus {
    /// At least one non-empty, valid polygon
    Usable { features: usize },
    /// No features, or every geometry is empty
    Empty,
    /// A geometry is not a valid polygon or multipolygon
    Invalid { reason: String },
}

/// Geometries of a GeoJSON document, in document order
pub fn geometries(doc: &GeoJson) -> Vec<geojson::Geometry> {
    match doc {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .iter()
            .filter_map(|f| f.geometry.clone())
            .collect(),
        GeoJson::Feature(f) => f.geometry.clone().into_iter().collect(),
        GeoJson::Geometry(g) => vec![g.clone()],
    }
}

/// Convert a GeoJSON geometry into a GDAL geometry
pub fn to_gdal(geometry: &geojson::Geometry) -> Result<Geometry, GdalError> {
    let text = serde_json::to_string(geometry)
        .map_err(|e| GdalError::UnsupportedFormat(format!("unserialisable geometry: {}", e)))?;
    Ok(Geometry::from_geojson(&text)?)
}

/// Convert a GDAL geometry back into GeoJSON
pub fn from_gdal(geometry: &Geometry) -> Result<geojson::Geometry, GdalError> {
    serde_json::from_str(&geometry.json()?)
        .map_err(|e| GdalError::UnsupportedFormat(format!("GDAL produced unreadable GeoJSON: {}", e)))
}

/// Only areal geometries can clip a raster
pub fn is_polygonal(geometry: &Geometry) -> bool {
    matches!(geometry.geometry_name().as_str(), "POLYGON" | "MULTIPOLYGON")
}

/// Classify the cutline stored at `path`
pub fn inspect(path: &Path) -> std::io::Result<CutlineStatus> {
    let text = std::fs::read_to_string(path)?;
    match text.parse::<GeoJson>() {
        Ok(doc) => Ok(classify(&doc)),
        Err(e) => Ok(CutlineStatus::Invalid {
            reason: format!("cutline is not GeoJSON: {}", e),
        }),
    }
}

/// Classify an in-memory GeoJSON document
pub fn classify(doc: &GeoJson) -> CutlineStatus {
    let mut usable = 0;
    for (idx, geometry) in geometries(doc).iter().enumerate() {
        let geom = match to_gdal(geometry) {
            Ok(g) => g,
            Err(e) => {
                return CutlineStatus::Invalid {
                    reason: format!("geometry #{} could not be parsed: {}", idx, e),
                };
            }
        };
        if geom.is_empty() {
            continue;
        }
        if !is_polygonal(&geom) {
            return CutlineStatus::Invalid {
                reason: format!("geometry #{} is a {}, not a polygon", idx, geom.geometry_name()),
            };
        }
        if !geom.is_valid() {
            return CutlineStatus::Invalid {
                reason: format!("geometry #{} is not topologically valid", idx),
            };
        }
        usable += 1;
    }
    if usable == 0 {
        CutlineStatus::Empty
    } else {
        CutlineStatus::Usable { features: usable }
    }
}

/// Attempt to repair an invalid polygon with a zero-width buffer.
/// Returns `None` when the result is still invalid, empty or not polygonal.
pub fn repair(geometry: &geojson::Geometry) -> Option<geojson::Geometry> {
    let geom = to_gdal(geometry).ok()?;
    if !is_polygonal(&geom) {
        return None;
    }
    if geom.is_valid() {
        return Some(geometry.clone());
    }
    let fixed = geom.buffer(0.0, 30).ok()?;
    if fixed.is_empty() || !fixed.is_valid() || !is_polygonal(&fixed) {
        return None;
    }
    from_gdal(&fixed).ok()
}

/// Union of `geometries` as a single GeoJSON geometry.
/// A geometry GDAL cannot union is left out with a warning.
pub fn dissolve(geometries: &[geojson::Geometry]) -> Result<Option<geojson::Geometry>, GdalError> {
    let mut merged: Option<Geometry> = None;
    for (idx, g) in geometries.iter().enumerate() {
        let geom = to_gdal(g)?;
        merged = Some(match merged {
            None => geom,
            Some(acc) => match acc.union(&geom) {
                Some(union) => union,
                None => {
                    warn!(
                        "Union failed for geometry #{} ({}); leaving it out of the footprint",
                        idx,
                        geom.geometry_name()
                    );
                    acc
                }
            },
        });
    }
    merged.as_ref().map(from_gdal).transpose()
}

/// A feature carrying `geometry` and one `key: value` property
pub fn feature(geometry: geojson::Geometry, key: &str, value: Value) -> Feature {
    let mut properties = Map::new();
    properties.insert(key.to_string(), value);
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Wrap `geometries` as a FeatureCollection, tagging each with `identifier`
pub fn feature_collection(identifier: &str, geometries: &[geojson::Geometry]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: geometries
            .iter()
            .map(|g| feature(g.clone(), "identifier", Value::from(identifier)))
            .collect(),
        foreign_members: None,
    }
}
