//! Pixel-mask transform and plate footprints.
//!
//! Each annotation's resource mask is handed to `allmaps transform pixel-mask`,
//! which writes the mask as GeoJSON in the target CRS. The result is
//! normalised into a FeatureCollection tagged with the plate identifier and
//! becomes that plate's cutline. Usable cutlines are then gathered into a
//! per-plate index and a single dissolved footprint.
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::cutline::{self, CutlineStatus};
use crate::core::layout::list_files;
use crate::io::GdalError;
use crate::io::annotation::Annotation;
use crate::io::tools::{RasterToolkit, ToolError};
use crate::types::FailureClass;

/// Smallest vertex count that can enclose an area
pub const MIN_MASK_VERTICES: usize = 3;

const CUTLINE_SUFFIX: &str = "-transformed";

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("resource mask has {found} vertices, at least 3 required")]
    TooFewVertices { found: usize },

    #[error("pixel mask transform failed: {0}")]
    Transform(#[source] ToolError),

    #[error("transformed mask has no features: {0:?}")]
    Empty(PathBuf),

    #[error("transformed mask is invalid: {reason}")]
    Invalid { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MaskError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            MaskError::TooFewVertices { .. } | MaskError::Invalid { .. } => {
                FailureClass::InvalidMask
            }
            MaskError::Empty(_) => FailureClass::NoCutline,
            MaskError::Transform(_) | MaskError::Io(_) => FailureClass::BadMask,
        }
    }
}

/// Transform one plate's pixel mask into its cutline at `cutline_path`.
/// Returns the number of polygons written.
///
/// Invalid polygons are repaired with a zero-width buffer. When the tool ran
/// but its output is unusable, the raw output is left in place for inspection.
pub fn transform_mask(
    annotation: &Annotation,
    annotation_path: &Path,
    cutline_path: &Path,
    toolkit: &dyn RasterToolkit,
) -> Result<usize, MaskError> {
    let vertices = annotation.resource_mask.len();
    if vertices < MIN_MASK_VERTICES {
        if cutline_path.exists() {
            debug!("Removing stale cutline {:?}", cutline_path);
            std::fs::remove_file(cutline_path)?;
        }
        return Err(MaskError::TooFewVertices { found: vertices });
    }

    info!("Transforming pixel mask for {}", annotation.map_id);
    toolkit
        .transform_pixel_mask(annotation_path, cutline_path)
        .map_err(MaskError::Transform)?;

    let text = std::fs::read_to_string(cutline_path)?;
    let doc: GeoJson = text.parse().map_err(|e| MaskError::Invalid {
        reason: format!("output is not GeoJSON: {}", e),
    })?;

    let mut polygons = Vec::new();
    for (idx, geometry) in cutline::geometries(&doc).iter().enumerate() {
        let parsed = cutline::to_gdal(geometry).map_err(|e| MaskError::Invalid {
            reason: format!("geometry #{} could not be parsed: {}", idx, e),
        })?;
        if parsed.is_empty() {
            continue;
        }
        if !cutline::is_polygonal(&parsed) {
            return Err(MaskError::Invalid {
                reason: format!("geometry #{} is a {}, not a polygon", idx, parsed.geometry_name()),
            });
        }
        if !parsed.is_valid() {
            warn!(
                "Mask geometry #{} of {} is invalid; buffering by zero",
                idx, annotation.map_id
            );
        }
        let repaired = cutline::repair(geometry).ok_or_else(|| MaskError::Invalid {
            reason: format!("geometry #{} could not be repaired", idx),
        })?;
        polygons.push(repaired);
    }
    if polygons.is_empty() {
        return Err(MaskError::Empty(cutline_path.to_path_buf()));
    }

    let normalised = GeoJson::FeatureCollection(cutline::feature_collection(
        &annotation.map_id,
        &polygons,
    ));
    std::fs::write(cutline_path, normalised.to_string())?;
    Ok(polygons.len())
}

/// Usable cutlines of every plate, keyed by plate identifier
#[derive(Debug, Clone, Default)]
pub struct PlateIndex {
    plates: Vec<(String, Vec<geojson::Geometry>)>,
}

impl PlateIndex {
    /// Gather every usable `*-transformed.geojson` in `dir`, sorted by file name.
    /// Empty or invalid cutlines are left out with a warning.
    pub fn from_cutlines(dir: &Path) -> std::io::Result<Self> {
        let mut plates = Vec::new();
        for path in list_files(dir, "geojson")? {
            let Some(identifier) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(CUTLINE_SUFFIX).to_string())
            else {
                continue;
            };
            let Ok(doc) = std::fs::read_to_string(&path)?.parse::<GeoJson>() else {
                warn!("Leaving unreadable cutline {:?} out of the index", path);
                continue;
            };
            match cutline::classify(&doc) {
                CutlineStatus::Usable { .. } => {
                    plates.push((identifier, cutline::geometries(&doc)));
                }
                status => warn!("Leaving cutline {:?} out of the index: {:?}", path, status),
            }
        }
        Ok(Self { plates })
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.plates.iter().map(|(id, _)| id.as_str())
    }

    /// One feature per polygon, each tagged with its plate `identifier`
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .plates
                .iter()
                .flat_map(|(id, geoms)| cutline::feature_collection(id, geoms).features)
                .collect(),
            foreign_members: None,
        }
    }

    /// Union of every plate polygon as a single-feature collection
    pub fn footprint(&self) -> Result<Option<FeatureCollection>, GdalError> {
        let all: Vec<geojson::Geometry> = self
            .plates
            .iter()
            .flat_map(|(_, geoms)| geoms.iter().cloned())
            .collect();
        Ok(cutline::dissolve(&all)?.map(|geometry| FeatureCollection {
            bbox: None,
            features: vec![cutline::feature(
                geometry,
                "plates",
                Value::from(self.plates.len()),
            )],
            foreign_members: None,
        }))
    }
}
