use std::io::Write;
use std::path::Path;

use ::geojson::GeoJson;
use tracing::info;

use crate::error::{Error, Result};

/// Write a GeoJSON document, replacing `path` only once it is complete
pub fn write_geojson(path: &Path, doc: &GeoJson) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Processing(format!("no parent directory for {:?}", path)))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".geojson-")
        .tempfile_in(dir)?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), doc)?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!("Wrote {:?}", path);
    Ok(())
}
