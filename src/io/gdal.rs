use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, errors::GdalError as GdalCrateError};
use std::path::Path;
use thiserror::Error;

/// Errors encountered when using GDAL bindings
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Coordinate buffers differ in length: {0} vs {1}")]
    LengthMismatch(usize, usize),
}

/// Shape of a raster opened through GDAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterInfo {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
}

impl RasterInfo {
    /// Open a GDAL-supported raster and read its shape
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        Ok(RasterInfo {
            size_x: size_x as usize,
            size_y: size_y as usize,
            bands,
        })
    }
}

/// Point reprojection between two CRS definitions using GDAL/PROJ.
///
/// Both ends use traditional GIS axis order, so inputs and outputs are always
/// (x, y) = (easting/longitude, northing/latitude) regardless of the
/// authority's declared axis order.
pub struct GdalReprojector {
    transform: CoordTransform,
}

impl GdalReprojector {
    pub fn new(source_crs: &str, target_crs: &str) -> Result<Self, GdalError> {
        let mut source = SpatialRef::from_definition(source_crs)?;
        source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let mut target = SpatialRef::from_definition(target_crs)?;
        target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let transform = CoordTransform::new(&source, &target)?;
        Ok(Self { transform })
    }

    /// Transform coordinates in place; element `i` of the output is element `i` of the input
    pub fn transform_in_place(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<(), GdalError> {
        if xs.len() != ys.len() {
            return Err(GdalError::LengthMismatch(xs.len(), ys.len()));
        }
        let mut zs = vec![0.0; xs.len()];
        self.transform.transform_coords(xs, ys, &mut zs)?;
        Ok(())
    }
}
