use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{ResampleKernel, ResolutionStrategy};

/// Pipeline parameters suitable for JSON config files.
/// Every section falls back to its `Default` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CRS the annotation GCP coordinates are expressed in
    pub source_crs: String,
    /// CRS shared by every downstream raster (tagged, warped, mosaic)
    pub target_crs: String,
    pub endpoints: Endpoints,
    pub gcp: GcpKeys,
    pub image_key: ImageKeyRule,
    pub tag: TagOptions,
    pub warp: WarpOptions,
    pub vrt: VrtOptions,
    pub tiles: TileOptions,
    pub tools: ToolPaths,
    pub tileset: TilesetTemplate,
    /// Record plates without a cutline file as failures instead of warping unclipped
    pub cutline_required: bool,
    /// Band count expected from downloaded source images; `None` disables the check
    pub expected_bands: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_crs: "EPSG:4326".to_string(),
            target_crs: "EPSG:3857".to_string(),
            endpoints: Endpoints::default(),
            gcp: GcpKeys::default(),
            image_key: ImageKeyRule::default(),
            tag: TagOptions::default(),
            warp: WarpOptions::default(),
            vrt: VrtOptions::default(),
            tiles: TileOptions::default(),
            tools: ToolPaths::default(),
            tileset: TilesetTemplate::default(),
            cutline_required: true,
            expected_bands: Some(3),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

/// Remote service URL templates.
///
/// Placeholders: `{identifier}` (catalog id), `{manifest}` (expanded manifest
/// URL) and `{map_id}` (per-map annotation id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub manifest: String,
    pub annotation_index: String,
    pub map_annotation: String,
    pub collection_editor: String,
    pub map_editor: String,
    /// Appended to an image service URL to request the full-resolution raster
    pub image_request_suffix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            manifest: "https://www.digitalcommonwealth.org/search/{identifier}/manifest.json"
                .to_string(),
            annotation_index: "https://annotations.allmaps.org/?url={manifest}".to_string(),
            map_annotation: "https://annotations.allmaps.org/maps/{map_id}".to_string(),
            collection_editor: "https://editor.allmaps.org/#/collection?url={manifest}"
                .to_string(),
            map_editor:
                "https://editor.allmaps.org/#/georeference?url=https://annotations.allmaps.org/maps/{map_id}"
                    .to_string(),
            image_request_suffix: "/full/full/0/default.tif".to_string(),
        }
    }
}

impl Endpoints {
    pub fn manifest_url(&self, identifier: &str) -> String {
        self.manifest.replace("{identifier}", identifier)
    }

    pub fn annotation_index_url(&self, identifier: &str) -> String {
        self.annotation_index
            .replace("{manifest}", &self.manifest_url(identifier))
    }

    pub fn map_annotation_url(&self, map_id: &str) -> String {
        self.map_annotation.replace("{map_id}", map_id)
    }

    pub fn collection_editor_url(&self, identifier: &str) -> String {
        self.collection_editor
            .replace("{manifest}", &self.manifest_url(identifier))
    }

    pub fn map_editor_url(&self, map_id: &str) -> String {
        self.map_editor.replace("{map_id}", map_id)
    }

    /// URL to fetch raster bytes from. Sources that already name a file are
    /// used as-is (a `.jpg` rendition is swapped for `.tif`); image services
    /// get the full-resolution request suffix.
    pub fn image_download_url(&self, source: &str) -> String {
        let lower = source.to_ascii_lowercase();
        if lower.ends_with(".jpg") {
            format!("{}.tif", &source[..source.len() - 4])
        } else if lower.ends_with(".tif") || lower.ends_with(".tiff") {
            source.to_string()
        } else {
            format!(
                "{}{}",
                source.trim_end_matches('/'),
                self.image_request_suffix
            )
        }
    }
}

/// Annotation property keys that hold the pixel coordinate of a GCP.
/// Looked up in order; the first key present wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpKeys {
    pub pixel_keys: Vec<String>,
    pub min_points: usize,
}

impl Default for GcpKeys {
    fn default() -> Self {
        Self {
            pixel_keys: vec!["resourceCoords".to_string(), "pixelCoords".to_string()],
            min_points: 3,
        }
    }
}

/// Rule deriving the local image key from a source-image URL.
///
/// With a `marker`, the key is the text following the marker, truncated to
/// `length` characters when set. Without a marker (or when it is absent from
/// the URL) the last non-empty path segment is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageKeyRule {
    pub marker: Option<String>,
    pub length: Option<usize>,
}

impl ImageKeyRule {
    pub fn key_for(&self, source: &str) -> String {
        let source = source.trim_end_matches('/');
        let raw = self
            .marker
            .as_deref()
            .filter(|m| !m.is_empty())
            .and_then(|m| source.split_once(m).map(|(_, rest)| rest))
            .map(|rest| match self.length {
                Some(n) => rest.chars().take(n).collect::<String>(),
                None => rest.to_string(),
            })
            .unwrap_or_else(|| {
                source
                    .rsplit('/')
                    .find(|s| !s.is_empty())
                    .unwrap_or(source)
                    .to_string()
            });
        let stem = raw
            .strip_suffix(".tif")
            .or_else(|| raw.strip_suffix(".jpg"))
            .unwrap_or(&raw);
        stem.chars()
            .map(|c| match c {
                ':' | '/' | '\\' | '?' | '&' | '=' => '_',
                other => other,
            })
            .collect()
    }
}

/// Options for the GCP tagging pass (`gdal_translate`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagOptions {
    pub format: String,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            format: "GTiff".to_string(),
        }
    }
}

/// Options for the warp pass (`gdalwarp`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    pub format: String,
    pub resampling: ResampleKernel,
    /// Output ground resolution in target CRS units per pixel (x, y)
    pub resolution: (f64, f64),
    pub target_aligned_pixels: bool,
    pub polynomial_order: Option<u8>,
    pub dst_alpha: bool,
    pub dst_nodata: Option<f64>,
    pub crop_to_cutline: bool,
    pub copy_metadata: bool,
    pub multithread: bool,
    pub creation_options: Vec<String>,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            format: "GTiff".to_string(),
            resampling: ResampleKernel::Cubic,
            resolution: (0.1, 0.1),
            target_aligned_pixels: true,
            polynomial_order: Some(1),
            dst_alpha: true,
            dst_nodata: Some(0.0),
            crop_to_cutline: true,
            copy_metadata: true,
            multithread: true,
            creation_options: vec!["COMPRESS=LZW".to_string(), "BIGTIFF=YES".to_string()],
        }
    }
}

/// Options for the virtual composite (`gdalbuildvrt`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VrtOptions {
    pub resolution: ResolutionStrategy,
    pub separate: bool,
    pub src_nodata: Option<f64>,
}

impl Default for VrtOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionStrategy::Highest,
            separate: false,
            src_nodata: Some(0.0),
        }
    }
}

/// Options for the XYZ tile export (`gdal2tiles.py`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub processes: usize,
    /// Skip fully transparent tiles
    pub exclude_transparent: bool,
    pub webviewer: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            min_zoom: 13,
            max_zoom: 20,
            processes: 4,
            exclude_transparent: true,
            webviewer: false,
        }
    }
}

/// Executables invoked by the command-line toolkit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub gdal_translate: String,
    pub gdalwarp: String,
    pub gdalbuildvrt: String,
    pub gdal2tiles: String,
    pub allmaps: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            gdal_translate: "gdal_translate".to_string(),
            gdalwarp: "gdalwarp".to_string(),
            gdalbuildvrt: "gdalbuildvrt".to_string(),
            gdal2tiles: "gdal2tiles.py".to_string(),
            allmaps: "allmaps".to_string(),
        }
    }
}

/// Values written into the `tileset.json` template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesetTemplate {
    pub description: String,
    pub attribution: String,
    /// Tile URL; `{identifier}` is substituted, `{z}/{x}/{y}` are kept
    pub tiles_url: String,
    pub data_url: String,
}

impl Default for TilesetTemplate {
    fn default() -> Self {
        Self {
            description: "Title (Author, Year)".to_string(),
            attribution: "<a href=\"https://leventhalmap.org\">Leventhal Map & Education Center</a> at the <a href=\"https://bpl.org\">Boston Public Library</a>".to_string(),
            tiles_url: "https://s3.us-east-2.wasabisys.com/urbanatlases/{identifier}/tiles/{z}/{x}/{y}.png".to_string(),
            data_url: "https://s3.us-east-2.wasabisys.com/urbanatlases/{identifier}/plates.geojson".to_string(),
        }
    }
}
