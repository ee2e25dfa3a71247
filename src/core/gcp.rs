//! Ground control point extraction.
//!
//! Turns an annotation's GCP features into (pixel, target-coordinate) pairs:
//! pixel positions are read from the configured property keys and geographic
//! positions are reprojected into the target CRS in one batch, preserving
//! input order.
use tracing::warn;

use crate::core::params::GcpKeys;
use crate::core::rectify::RectifyError;
use crate::io::GdalError;
use crate::io::annotation::GcpFeature;
use crate::io::gdal::GdalReprojector;

/// A paired (pixel, geographic) coordinate used to fit the rectification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundControlPoint {
    /// (x, y) in the source CRS
    pub geographic: (f64, f64),
    /// (x, y) in the target CRS
    pub target: (f64, f64),
    /// Column in the source raster
    pub pixel: f64,
    /// Row in the source raster
    pub line: f64,
}

/// Batch coordinate reprojection. Output `i` must correspond to input `i`.
pub trait Reproject {
    fn reproject(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<(), GdalError>;
}

impl Reproject for GdalReprojector {
    fn reproject(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<(), GdalError> {
        self.transform_in_place(xs, ys)
    }
}

/// Read usable GCPs from `features` and reproject them.
///
/// Features without a Point geometry, without any of the configured pixel
/// keys, or with negative pixel coordinates are skipped with a warning.
pub fn extract_gcps(
    features: &[GcpFeature],
    keys: &GcpKeys,
    reprojector: &dyn Reproject,
) -> Result<Vec<GroundControlPoint>, RectifyError> {
    let mut usable = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let Some(geographic) = feature.geographic() else {
            warn!("GCP #{} has no point geometry; skipping", idx);
            continue;
        };
        let Some((pixel, line)) = feature.pixel(&keys.pixel_keys) else {
            warn!(
                "GCP #{} has none of the pixel keys {:?}; skipping",
                idx, keys.pixel_keys
            );
            continue;
        };
        if pixel < 0.0 || line < 0.0 {
            warn!("GCP #{} has negative pixel coordinates; skipping", idx);
            continue;
        }
        usable.push((geographic, pixel, line));
    }

    let mut xs: Vec<f64> = usable.iter().map(|(g, _, _)| g.0).collect();
    let mut ys: Vec<f64> = usable.iter().map(|(g, _, _)| g.1).collect();
    if !usable.is_empty() {
        reprojector.reproject(&mut xs, &mut ys)?;
    }

    Ok(usable
        .into_iter()
        .zip(xs.into_iter().zip(ys))
        .map(|((geographic, pixel, line), target)| GroundControlPoint {
            geographic,
            target,
            pixel,
            line,
        })
        .collect())
}

/// Check that `gcps` can support an affine fit: at least `min_points` points,
/// not all on one line in pixel space.
pub fn validate_fit(gcps: &[GroundControlPoint], min_points: usize) -> Result<(), RectifyError> {
    if gcps.len() < min_points.max(3) {
        return Err(RectifyError::InsufficientPoints {
            found: gcps.len(),
            required: min_points.max(3),
        });
    }
    if is_collinear(gcps) {
        return Err(RectifyError::CollinearPoints { found: gcps.len() });
    }
    Ok(())
}

fn is_collinear(gcps: &[GroundControlPoint]) -> bool {
    let a = (gcps[0].pixel, gcps[0].line);
    // Pick the point farthest from `a` as the line direction
    let Some(b) = gcps
        .iter()
        .map(|g| (g.pixel, g.line))
        .max_by(|p, q| dist2(a, *p).total_cmp(&dist2(a, *q)))
    else {
        return true;
    };
    let base = dist2(a, b).sqrt();
    if base < f64::EPSILON {
        return true;
    }
    gcps.iter().all(|g| {
        let cross = (b.0 - a.0) * (g.line - a.1) - (b.1 - a.1) * (g.pixel - a.0);
        // Perpendicular distance from the line, in pixels
        (cross / base).abs() < 1e-6
    })
}

fn dist2(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}


#[cfg(test)]
mod tests {
    use super::testing::ScaleReprojector;
    use super::*;
    use crate::io::annotation::{Annotation, AnnotationPage, fixtures};

    fn features(pixel_key: &str, points: &[((f64, f64), (f64, f64))]) -> Vec<GcpFeature> {
        let json = fixtures::annotation_json("s", pixel_key, points);
        let page: AnnotationPage = serde_json::from_str(&json).unwrap();
        Annotation::from_page("m", page).unwrap().gcp_features
    }

    #[test]
    fn reprojection_preserves_order() {
        let pts: Vec<_> = (0..7)
            .map(|i| ((i as f64, 10.0 - i as f64), (i as f64 * 3.0, (i * i) as f64)))
            .collect();
        let gcps = extract_gcps(&features("pixelCoords", &pts), &GcpKeys::default(), &ScaleReprojector).unwrap();
        assert_eq!(gcps.len(), 7);
        for (i, g) in gcps.iter().enumerate() {
            assert_eq!(g.geographic, pts[i].0);
            assert_eq!(g.target, (pts[i].0.0 * 1000.0, pts[i].0.1 * 1000.0 + 1.0));
            assert_eq!((g.pixel, g.line), pts[i].1);
        }
    }

    #[test]
    fn both_pixel_key_spellings_are_supported() {
        let pts = fixtures::four_points();
        let keys = GcpKeys::default();
        let a = extract_gcps(&features("pixelCoords", &pts), &keys, &ScaleReprojector).unwrap();
        let b = extract_gcps(&features("resourceCoords", &pts), &keys, &ScaleReprojector).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn unconfigured_key_yields_no_points() {
        let keys = GcpKeys {
            pixel_keys: vec!["resourceCoords".to_string()],
            min_points: 3,
        };
        let gcps = extract_gcps(&features("pixelCoords", &fixtures::four_points()), &keys, &ScaleReprojector).unwrap();
        assert!(gcps.is_empty());
    }

    #[test]
    fn negative_pixels_are_dropped() {
        let mut pts = fixtures::four_points();
        pts[2].1 = (-1.0, 5.0);
        let gcps = extract_gcps(&features("pixelCoords", &pts), &GcpKeys::default(), &ScaleReprojector).unwrap();
        assert_eq!(gcps.len(), 3);
        assert_eq!(gcps[2].pixel, 0.0);
    }

    #[test]
    fn fewer_than_three_points_is_insufficient() {
        let all = fixtures::four_points();
        let gcps = extract_gcps(&features("pixelCoords", &all[..2]), &GcpKeys::default(), &ScaleReprojector).unwrap();
        assert!(matches!(
            validate_fit(&gcps, 3),
            Err(RectifyError::InsufficientPoints { found: 2, required: 3 })
        ));
    }

    #[test]
    fn collinear_points_are_rejected() {
        let pts = vec![
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 0.0), (10.0, 10.0)),
            ((2.0, 0.0), (20.0, 20.0)),
            ((3.0, 0.0), (35.0, 35.0)),
        ];
        let gcps = extract_gcps(&features("pixelCoords", &pts), &GcpKeys::default(), &ScaleReprojector).unwrap();
        assert!(matches!(
            validate_fit(&gcps, 3),
            Err(RectifyError::CollinearPoints { found: 4 })
        ));
        let ok = extract_gcps(&features("pixelCoords", &fixtures::four_points()), &GcpKeys::default(), &ScaleReprojector).unwrap();
        assert!(validate_fit(&ok, 3).is_ok());
    }
}
