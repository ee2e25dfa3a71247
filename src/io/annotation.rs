//! Georeference annotations as published by the annotation service.
//!
//! Only the parts the pipeline consumes are modelled: the source image
//! reference, the GCP features and the pixel-space resource mask. The raw
//! JSON is persisted untouched by the fetcher; this module only reads it.
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// One annotation page, as returned by the per-map annotation API
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationPage {
    pub items: Vec<AnnotationItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationItem {
    #[serde(default)]
    pub id: Option<String>,
    pub target: Target,
    pub body: Body,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub source: SourceRef,
    #[serde(default)]
    pub selector: Option<Selector>,
}

/// Older annotations carry the image URL as a string, newer ones an image resource object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Url(String),
    Resource {
        #[serde(alias = "@id")]
        id: String,
    },
}

impl SourceRef {
    pub fn url(&self) -> &str {
        match self {
            SourceRef::Url(url) => url,
            SourceRef::Resource { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Selector {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub features: Vec<GcpFeature>,
}

/// A GeoJSON point feature pairing a geographic position with a pixel position
#[derive(Debug, Clone, Deserialize)]
pub struct GcpFeature {
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<PointGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl GcpFeature {
    /// Geographic (x, y) of a Point geometry
    pub fn geographic(&self) -> Option<(f64, f64)> {
        let geom = self.geometry.as_ref()?;
        if geom.kind != "Point" || geom.coordinates.len() < 2 {
            return None;
        }
        Some((geom.coordinates[0], geom.coordinates[1]))
    }

    /// Pixel (column, row) read from the first property key present
    pub fn pixel<S: AsRef<str>>(&self, keys: &[S]) -> Option<(f64, f64)> {
        let value = keys
            .iter()
            .find_map(|k| self.properties.get(k.as_ref()))?;
        let arr = value.as_array()?;
        if arr.len() < 2 {
            return None;
        }
        Some((arr[0].as_f64()?, arr[1].as_f64()?))
    }
}

/// A plate's annotation reduced to what rectification needs
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Stable per-plate key (the annotation's map id)
    pub map_id: String,
    /// Source image reference as published
    pub source: String,
    pub gcp_features: Vec<GcpFeature>,
    /// Resource mask vertices in pixel space; empty if the annotation has none
    pub resource_mask: Vec<(f64, f64)>,
}

impl Annotation {
    pub fn from_page(map_id: &str, page: AnnotationPage) -> Option<Self> {
        let item = page.items.into_iter().next()?;
        let resource_mask = item
            .target
            .selector
            .as_ref()
            .and_then(|s| s.value.as_deref())
            .map(parse_svg_polygon)
            .unwrap_or_default();
        Some(Self {
            map_id: map_id.to_string(),
            source: item.target.source.url().to_string(),
            gcp_features: item.body.features,
            resource_mask,
        })
    }

    /// Load a persisted annotation; the map id is the file stem
    pub fn load(path: &Path) -> Result<Self> {
        let map_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::MalformedAnnotation {
                path: path.to_path_buf(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let text = std::fs::read_to_string(path)?;
        let page: AnnotationPage =
            serde_json::from_str(&text).map_err(|e| Error::MalformedAnnotation {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::from_page(map_id, page).ok_or_else(|| Error::MalformedAnnotation {
            path: path.to_path_buf(),
            reason: "annotation page has no items".to_string(),
        })
    }
}

/// Vertices of the first `<polygon>` in an SVG selector.
/// Malformed markup yields no vertices.
pub fn parse_svg_polygon(svg: &str) -> Vec<(f64, f64)> {
    let mut reader = Reader::from_str(svg);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"polygon" =>
            {
                return polygon_points(e);
            }
            Ok(Event::Eof) => return Vec::new(),
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Unreadable SVG selector at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                return Vec::new();
            }
        }
    }
}

fn polygon_points(element: &BytesStart) -> Vec<(f64, f64)> {
    for attr in element.attributes() {
        let attr = match attr {
            Ok(a) => a,
            Err(e) => {
                warn!("Unreadable <polygon> attribute: {}", e);
                return Vec::new();
            }
        };
        if attr.key.local_name().as_ref() != b"points" {
            continue;
        }
        return match attr.unescape_value() {
            Ok(value) => parse_points(&value),
            Err(e) => {
                warn!("Unreadable <polygon> points: {}", e);
                Vec::new()
            }
        };
    }
    Vec::new()
}

/// SVG point list: numbers separated by whitespace and/or commas, taken in pairs
fn parse_points(list: &str) -> Vec<(f64, f64)> {
    let mut numbers = Vec::new();
    for token in list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        match token.parse::<f64>() {
            Ok(n) => numbers.push(n),
            Err(_) => {
                warn!("Non-numeric coordinate {:?} in polygon points", token);
                return Vec::new();
            }
        }
    }
    numbers.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

/// Identifier key from an annotation id that may be a bare id or a full URL
pub fn map_id_from(id: &str) -> String {
    id.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(id)
        .to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Annotation page with `n` GCPs using the given pixel property key
    pub fn annotation_json(source: &str, pixel_key: &str, points: &[((f64, f64), (f64, f64))]) -> String {
        let features: Vec<String> = points
            .iter()
            .map(|((lon, lat), (px, py))| {
                format!(
                    r#"{{"type":"Feature","properties":{{"{pixel_key}":[{px},{py}]}},"geometry":{{"type":"Point","coordinates":[{lon},{lat}]}}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"type":"AnnotationPage","items":[{{"id":"https://annotations.allmaps.org/maps/abc","type":"Annotation","target":{{"type":"SpecificResource","source":"{source}","selector":{{"type":"SvgSelector","value":"<svg width=\"100\" height=\"100\"><polygon points=\"0,0 100,0 100,100 0,100\" /></svg>"}}}},"body":{{"type":"FeatureCollection","features":[{}]}}}}]}}"#,
            features.join(",")
        )
    }

    pub fn four_points() -> Vec<((f64, f64), (f64, f64))> {
        vec![
            ((-71.06, 42.36), (0.0, 0.0)),
            ((-71.05, 42.36), (100.0, 0.0)),
            ((-71.05, 42.35), (100.0, 100.0)),
            ((-71.06, 42.35), (0.0, 100.0)),
        ]
    }
}
