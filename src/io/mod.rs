//! I/O layer: georeference annotations and the remote services that publish
//! them, GDAL-backed raster inspection and reprojection, the external
//! command-line tools, and `writers` for the documents placed next to the mosaic.
pub mod annotation;
pub mod fetch;

pub mod gdal;
pub use self::gdal::{GdalError, GdalReprojector, RasterInfo};

pub mod tools;
pub use tools::{GdalCommandLine, RasterToolkit, ToolError};

pub mod writers;
