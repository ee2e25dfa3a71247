//! Output documents written next to the mosaic: the TileJSON descriptor and
//! GeoJSON plate index and footprint.
pub mod geojson;
pub mod tileset;

pub use self::geojson::write_geojson;
pub use tileset::{tileset_document, write_tileset_if_missing};
