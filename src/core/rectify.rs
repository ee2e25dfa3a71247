//! Rectification of a single plate: tag the source raster with its GCPs, then
//! warp it into the target CRS clipped to the plate's cutline.
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::cutline::{self, CutlineStatus};
use crate::core::gcp::GroundControlPoint;
use crate::core::params::PipelineConfig;
use crate::io::GdalError;
use crate::io::tools::{RasterToolkit, TagRequest, ToolError, WarpRequest};
use crate::types::FailureClass;

/// Per-plate failures. Each maps onto exactly one `FailureClass`.
#[derive(Debug, Error)]
pub enum RectifyError {
    #[error("only {found} usable ground control points, at least {required} required")]
    InsufficientPoints { found: usize, required: usize },

    #[error("all {found} ground control points lie on one line")]
    CollinearPoints { found: usize },

    #[error("reprojecting ground control points failed: {0}")]
    Reproject(#[from] GdalError),

    #[error("source image not found: {0:?}")]
    MissingSource(PathBuf),

    #[error("cutline not found: {0:?}")]
    MissingCutline(PathBuf),

    #[error("cutline has no features to clip against: {0:?}")]
    NoCutlineFeatures(PathBuf),

    #[error("cutline geometry is invalid: {reason}")]
    InvalidMask { reason: String },

    #[error("tagging GCPs failed: {0}")]
    Tag(#[source] ToolError),

    #[error("warp failed: {0}")]
    Warp(#[source] ToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RectifyError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            RectifyError::InsufficientPoints { .. } | RectifyError::CollinearPoints { .. } => {
                FailureClass::InsufficientPoints
            }
            RectifyError::MissingSource(_) => FailureClass::MissingSource,
            RectifyError::MissingCutline(_) | RectifyError::NoCutlineFeatures(_) => {
                FailureClass::NoCutline
            }
            RectifyError::InvalidMask { .. } => FailureClass::InvalidMask,
            RectifyError::Reproject(_)
            | RectifyError::Tag(_)
            | RectifyError::Warp(_)
            | RectifyError::Io(_) => FailureClass::BadMask,
        }
    }
}

/// Everything needed to rectify one plate
#[derive(Debug, Clone)]
pub struct PlateJob<'a> {
    pub map_id: &'a str,
    pub source: &'a Path,
    pub intermediate: &'a Path,
    pub output: &'a Path,
    pub cutline: &'a Path,
    pub gcps: &'a [GroundControlPoint],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectifyOutcome {
    Warped,
    /// Output already existed; no tool was invoked
    Skipped,
}

/// Warped output already present: remove any stale intermediate and report a skip.
/// Returns `None` if the plate still needs warping.
pub fn skip_if_warped(output: &Path, intermediate: &Path) -> std::io::Result<Option<RectifyOutcome>> {
    if !output.exists() {
        return Ok(None);
    }
    info!("Skipping {:?}, already exists...", output);
    if intermediate.exists() {
        info!("Deleting stale temporary translate file {:?}", intermediate);
        std::fs::remove_file(intermediate)?;
    }
    Ok(Some(RectifyOutcome::Skipped))
}

/// Check the plate's cutline before warping, returning the path to clip with
pub fn resolve_cutline<'a>(
    cutline: &'a Path,
    required: bool,
) -> Result<Option<&'a Path>, RectifyError> {
    if !cutline.exists() {
        if required {
            return Err(RectifyError::MissingCutline(cutline.to_path_buf()));
        }
        warn!("No cutline at {:?}; warping without clipping", cutline);
        return Ok(None);
    }
    match cutline::inspect(cutline)? {
        CutlineStatus::Usable { features } => {
            debug!("Cutline {:?} has {} usable feature(s)", cutline, features);
            Ok(Some(cutline))
        }
        CutlineStatus::Empty => Err(RectifyError::NoCutlineFeatures(cutline.to_path_buf())),
        CutlineStatus::Invalid { reason } => Err(RectifyError::InvalidMask { reason }),
    }
}

/// Tag then warp one plate. The intermediate tagged raster is removed
/// afterwards whether or not the warp succeeded.
pub fn rectify_plate(
    job: &PlateJob<'_>,
    config: &PipelineConfig,
    toolkit: &dyn RasterToolkit,
) -> Result<RectifyOutcome, RectifyError> {
    if let Some(outcome) = skip_if_warped(job.output, job.intermediate)? {
        return Ok(outcome);
    }
    if !job.source.exists() {
        return Err(RectifyError::MissingSource(job.source.to_path_buf()));
    }
    let cutline = resolve_cutline(job.cutline, config.cutline_required)?;

    info!(
        "Tagging {} with {} GCPs in {}",
        job.map_id,
        job.gcps.len(),
        config.target_crs
    );
    let tagged = toolkit.tag(&TagRequest {
        source: job.source,
        output: job.intermediate,
        gcps: job.gcps,
        target_crs: &config.target_crs,
        options: &config.tag,
    });
    if let Err(e) = tagged {
        cleanup(job.intermediate);
        return Err(RectifyError::Tag(e));
    }

    info!(
        "Creating warped TIFF in {} for {}",
        config.target_crs, job.map_id
    );
    let warped = toolkit.warp(&WarpRequest {
        source: job.intermediate,
        output: job.output,
        target_crs: &config.target_crs,
        cutline,
        options: &config.warp,
    });
    info!("Deleting temporary translate file for {}", job.map_id);
    cleanup(job.intermediate);
    if let Err(e) = warped {
        // A failed warp may leave a truncated output that would be skipped next run
        cleanup(job.output);
        return Err(RectifyError::Warp(e));
    }
    Ok(RectifyOutcome::Warped)
}

fn cleanup(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {:?}: {}", path, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeToolkit;
    use super::*;
    use crate::core::cutline::fixtures::{bow_tie, collection, empty_collection, line, square};
    use crate::core::layout::StagingLayout;

    struct Plate {
        _dir: tempfile::TempDir,
        layout: StagingLayout,
        gcps: Vec<GroundControlPoint>,
    }

    fn plate(with_source: bool, cutline: Option<geojson::GeoJson>) -> Plate {
        let dir = tempfile::tempdir().unwrap();
        let layout = StagingLayout::new(dir.path());
        layout.ensure().unwrap();
        if with_source {
            std::fs::write(layout.image("src"), b"raw").unwrap();
        }
        if let Some(doc) = cutline {
            std::fs::write(layout.cutline("p1"), doc.to_string()).unwrap();
        }
        let gcps = (0..4)
            .map(|i| GroundControlPoint {
                geographic: (i as f64, i as f64),
                target: (i as f64, i as f64),
                pixel: (i % 2) as f64 * 100.0,
                line: (i / 2) as f64 * 100.0,
            })
            .collect();
        Plate {
            _dir: dir,
            layout,
            gcps,
        }
    }

    fn run(p: &Plate, toolkit: &FakeToolkit) -> Result<RectifyOutcome, RectifyError> {
        let (source, inter, out, cut) = (
            p.layout.image("src"),
            p.layout.intermediate("p1"),
            p.layout.warped_plate("p1"),
            p.layout.cutline("p1"),
        );
        let job = PlateJob {
            map_id: "p1",
            source: &source,
            intermediate: &inter,
            output: &out,
            cutline: &cut,
            gcps: &p.gcps,
        };
        rectify_plate(&job, &PipelineConfig::default(), toolkit)
    }

    #[test]
    fn warps_and_removes_intermediate() {
        let p = plate(true, Some(collection(&[square(0.0, 0.0, 10.0)])));
        let tk = FakeToolkit::default();
        assert_eq!(run(&p, &tk).unwrap(), RectifyOutcome::Warped);
        assert_eq!(tk.calls(), vec!["tag", "warp"]);
        assert!(p.layout.warped_plate("p1").exists());
        assert!(!p.layout.intermediate("p1").exists());
    }

    #[test]
    fn existing_output_is_untouched_and_stale_intermediate_removed() {
        let p = plate(true, Some(collection(&[square(0.0, 0.0, 10.0)])));
        std::fs::write(p.layout.warped_plate("p1"), b"original").unwrap();
        std::fs::write(p.layout.intermediate("p1"), b"stale").unwrap();
        let tk = FakeToolkit::default();
        assert_eq!(run(&p, &tk).unwrap(), RectifyOutcome::Skipped);
        assert!(tk.calls().is_empty());
        assert_eq!(std::fs::read(p.layout.warped_plate("p1")).unwrap(), b"original");
        assert!(!p.layout.intermediate("p1").exists());
    }

    #[test]
    fn empty_cutline_is_no_cutline_class() {
        let p = plate(true, Some(empty_collection()));
        let tk = FakeToolkit::default();
        let err = run(&p, &tk).unwrap_err();
        assert!(matches!(err, RectifyError::NoCutlineFeatures(_)));
        assert_eq!(err.failure_class(), FailureClass::NoCutline);
        assert!(tk.calls().is_empty());
    }

    #[test]
    fn missing_cutline_is_no_cutline_class() {
        let p = plate(true, None);
        let err = run(&p, &FakeToolkit::default()).unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::NoCutline);
    }

    #[test]
    fn invalid_cutline_is_invalid_mask_class() {
        let p = plate(true, Some(collection(&[bow_tie()])));
        let err = run(&p, &FakeToolkit::default()).unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::InvalidMask);
    }

    #[test]
    fn line_cutline_is_invalid_mask_and_never_warped() {
        let p = plate(true, Some(collection(&[line()])));
        let tk = FakeToolkit::default();
        let err = run(&p, &tk).unwrap_err();
        assert!(matches!(err, RectifyError::InvalidMask { .. }));
        assert_eq!(err.failure_class(), FailureClass::InvalidMask);
        assert!(tk.calls().is_empty());
    }

    #[test]
    fn warp_failure_is_bad_mask_and_cleans_up() {
        let p = plate(true, Some(collection(&[square(0.0, 0.0, 10.0)])));
        let tk = FakeToolkit {
            fail_warp: true,
            ..FakeToolkit::default()
        };
        let err = run(&p, &tk).unwrap_err();
        assert!(matches!(err, RectifyError::Warp(_)));
        assert_eq!(err.failure_class(), FailureClass::BadMask);
        assert!(!p.layout.intermediate("p1").exists());
        assert!(!p.layout.warped_plate("p1").exists());
    }

    #[test]
    fn missing_source_is_reported() {
        let p = plate(false, Some(collection(&[square(0.0, 0.0, 10.0)])));
        let err = run(&p, &FakeToolkit::default()).unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::MissingSource);
    }

    #[test]
    fn optional_cutline_warps_unclipped() {
        assert_eq!(resolve_cutline(Path::new("/nonexistent/c.geojson"), false).unwrap(), None);
    }
}
