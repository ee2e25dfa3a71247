//! `tileset.json` descriptor for the published XYZ tiles (TileJSON 2.2.0).
use std::path::Path;

use serde_json::{Value, json};
use tracing::info;

use crate::core::params::{TileOptions, TilesetTemplate};
use crate::error::Result;

pub const TILEJSON_VERSION: &str = "2.2.0";

/// Build the descriptor for `identifier`. Bounds are left empty for the
/// operator to fill in once the footprint is known.
pub fn tileset_document(identifier: &str, template: &TilesetTemplate, tiles: &TileOptions) -> Value {
    json!({
        "tilejson": TILEJSON_VERSION,
        "name": identifier,
        "description": template.description,
        "version": "1.0.0",
        "attribution": template.attribution,
        "scheme": "xyz",
        "tiles": [template.tiles_url.replace("{identifier}", identifier)],
        "data": [template.data_url.replace("{identifier}", identifier)],
        "minzoom": tiles.min_zoom,
        "maxzoom": tiles.max_zoom,
        "bounds": [],
    })
}

/// Write the descriptor to `path` unless one already exists, so manual edits survive re-runs.
/// Returns whether a file was written.
pub fn write_tileset_if_missing(
    path: &Path,
    identifier: &str,
    template: &TilesetTemplate,
    tiles: &TileOptions,
) -> Result<bool> {
    if path.exists() {
        info!("Skipping {:?}, already exists...", path);
        return Ok(false);
    }
    let doc = tileset_document(identifier, template, tiles);
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    info!("Wrote tileset template {:?}", path);
    Ok(true)
}
