//! High-level library API: one function per pipeline step. Each takes the
//! staging layout, the pipeline configuration and the external seams
//! (`AnnotationService`, `RasterToolkit`, `Reproject`) it needs, so the CLI and
//! tests drive exactly the same code. Prefer these entrypoints over the
//! low-level `core` and `io` modules when embedding platewarp.
use std::path::{Path, PathBuf};

use geojson::GeoJson;
use tracing::{debug, info, warn};

use crate::core::footprint::{PlateIndex, transform_mask};
use crate::core::gcp::{Reproject, extract_gcps, validate_fit};
use crate::core::layout::{StagingLayout, list_files};
use crate::core::mosaic::{
    MergeOrder, PlateComparator, anchor_paths, resolve_merge_order, write_order_file,
};
use crate::core::params::PipelineConfig;
use crate::core::rectify::{PlateJob, RectifyError, RectifyOutcome, rectify_plate, skip_if_warped};
use crate::core::report::FailureReport;
use crate::error::{Error, Result};
use crate::io::annotation::Annotation;
use crate::io::fetch::{AnnotationService, download_if_missing, fetch_annotation, list_map_ids};
use crate::io::gdal::RasterInfo;
use crate::io::tools::{RasterToolkit, TileRequest, VrtRequest};
use crate::io::writers::{write_geojson, write_tileset_if_missing};
use crate::types::FailureClass;

/// Per-step counts plus the plates that need manual remediation
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub failures: FailureReport,
}

impl BatchReport {
    fn fail(
        &mut self,
        class: FailureClass,
        plate_id: &str,
        config: &PipelineConfig,
        detail: impl Into<String>,
    ) {
        self.errors += 1;
        self.failures.record(
            class,
            plate_id,
            config.endpoints.map_editor_url(plate_id),
            detail,
        );
    }

    fn log_summary(&self, step: &str) {
        info!("{} complete!", step);
        info!("Processed: {}", self.processed);
        info!("Skipped: {}", self.skipped);
        info!("Errors: {}", self.errors);
    }
}

/// Outcome of `download_inputs`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub annotations: usize,
    pub images_downloaded: usize,
    pub images_skipped: usize,
    pub tileset_written: bool,
}

/// Fetch every annotation georeferenced on `identifier`'s manifest, then
/// download each distinct source image not yet on disk.
pub fn download_inputs(
    identifier: &str,
    layout: &StagingLayout,
    config: &PipelineConfig,
    service: &dyn AnnotationService,
) -> Result<DownloadReport> {
    layout.ensure()?;
    info!(
        "Finding annotations for manifest {}",
        config.endpoints.manifest_url(identifier)
    );
    let map_ids = list_map_ids(service, &config.endpoints, identifier)?;
    info!("{} georeferenced map(s) found", map_ids.len());

    let mut report = DownloadReport::default();
    let mut sources: Vec<String> = Vec::new();
    for map_id in &map_ids {
        for source in fetch_annotation(service, &config.endpoints, layout, map_id)? {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        report.annotations += 1;
    }

    for source in &sources {
        let dest = layout.image(&config.image_key.key_for(source));
        let url = config.endpoints.image_download_url(source);
        match download_if_missing(service, &url, &dest)? {
            Some(_) => report.images_downloaded += 1,
            None => report.images_skipped += 1,
        }
    }

    report.tileset_written = write_tileset_if_missing(
        &layout.tileset(),
        identifier,
        &config.tileset,
        &config.tiles,
    )?;
    info!(
        "Downloaded {} image(s), {} already present",
        report.images_downloaded, report.images_skipped
    );
    Ok(report)
}

/// Outcome of `check_inputs`
#[derive(Debug, Clone, Default)]
pub struct InputCheck {
    pub images_checked: usize,
    pub unreadable: Vec<PathBuf>,
    /// Images whose band count differs from the expected count
    pub unexpected_bands: Vec<(PathBuf, usize)>,
    /// Annotations (by map id) whose source image is not on disk
    pub missing_sources: Vec<(String, PathBuf)>,
    pub malformed_annotations: Vec<PathBuf>,
}

impl InputCheck {
    pub fn is_clean(&self) -> bool {
        self.unreadable.is_empty()
            && self.unexpected_bands.is_empty()
            && self.missing_sources.is_empty()
            && self.malformed_annotations.is_empty()
    }
}

/// Open every downloaded image with GDAL and check that each annotation's
/// source image is present.
pub fn check_inputs(layout: &StagingLayout, config: &PipelineConfig) -> Result<InputCheck> {
    let mut check = InputCheck::default();
    for path in list_files(&layout.images(), "tif")? {
        if is_intermediate(&path) {
            continue;
        }
        check.images_checked += 1;
        match RasterInfo::open(&path) {
            Ok(info) => {
                debug!(
                    "{:?}: {}x{} pixels, {} band(s)",
                    path, info.size_x, info.size_y, info.bands
                );
                if let Some(expected) = config.expected_bands {
                    if info.bands != expected {
                        warn!(
                            "{:?} has {} band(s), expected {}",
                            path, info.bands, expected
                        );
                        check.unexpected_bands.push((path, info.bands));
                    }
                }
            }
            Err(e) => {
                warn!("Could not open {:?}: {}", path, e);
                check.unreadable.push(path);
            }
        }
    }

    for path in layout.annotation_files()? {
        match Annotation::load(&path) {
            Ok(annotation) => {
                let image = layout.image(&config.image_key.key_for(&annotation.source));
                if !image.exists() {
                    warn!("{}: source image {:?} missing", annotation.map_id, image);
                    check.missing_sources.push((annotation.map_id, image));
                }
            }
            Err(e) => {
                warn!("{}", e);
                check.malformed_annotations.push(path);
            }
        }
    }

    info!(
        "Checked {} image(s): {} unreadable, {} with unexpected bands, {} missing source(s)",
        check.images_checked,
        check.unreadable.len(),
        check.unexpected_bands.len(),
        check.missing_sources.len()
    );
    Ok(check)
}

fn is_intermediate(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with("-translated"))
}

/// Transform every plate's pixel mask into a cutline, then write the plate
/// index and dissolved footprint.
///
/// When a restart manifest from a previous run exists, only the plates it
/// lists are re-fetched from the annotation service and re-transformed.
pub fn transform_masks(
    layout: &StagingLayout,
    config: &PipelineConfig,
    service: &dyn AnnotationService,
    toolkit: &dyn RasterToolkit,
) -> Result<BatchReport> {
    let manifest = layout.failure_report();
    let targets: Vec<PathBuf> = if manifest.is_file() {
        let retry = FailureReport::read_csv(&manifest)?.plate_ids();
        info!(
            "Restart manifest {:?} lists {} plate(s); re-fetching them",
            manifest,
            retry.len()
        );
        for map_id in &retry {
            fetch_annotation(service, &config.endpoints, layout, map_id)?;
        }
        retry.iter().map(|id| layout.annotation(id)).collect()
    } else {
        layout.annotation_files()?
    };

    let mut report = BatchReport::default();
    for path in &targets {
        let annotation = match Annotation::load(path) {
            Ok(a) => a,
            Err(e) => {
                let plate_id = plate_id_of(path);
                report.fail(FailureClass::BadMask, &plate_id, config, e.to_string());
                continue;
            }
        };
        let cutline = layout.cutline(&annotation.map_id);
        match transform_mask(&annotation, path, &cutline, toolkit) {
            Ok(polygons) => {
                info!("{}: {} mask polygon(s)", annotation.map_id, polygons);
                report.processed += 1;
            }
            Err(e) => report.fail(e.failure_class(), &annotation.map_id, config, e.to_string()),
        }
    }

    let index = PlateIndex::from_cutlines(&layout.transformed())?;
    if index.is_empty() {
        warn!("No usable cutlines; plate index and footprint not written");
    } else {
        write_geojson(
            &layout.plate_index(),
            &GeoJson::FeatureCollection(index.to_feature_collection()),
        )?;
        if let Some(footprint) = index.footprint()? {
            write_geojson(&layout.footprint(), &GeoJson::FeatureCollection(footprint))?;
        }
    }

    report.failures.finish(&manifest)?;
    report.log_summary("Mask transform");
    Ok(report)
}

/// Rectify every annotated plate: extract and validate its GCPs, tag the
/// source image, and warp it clipped to its cutline. Per-plate failures are
/// recorded and the remaining plates still run.
pub fn warp_plates(
    layout: &StagingLayout,
    config: &PipelineConfig,
    toolkit: &dyn RasterToolkit,
    reprojector: &dyn Reproject,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for path in layout.annotation_files()? {
        let map_id = plate_id_of(&path);
        let output = layout.warped_plate(&map_id);
        let intermediate = layout.intermediate(&map_id);
        if skip_if_warped(&output, &intermediate)?.is_some() {
            report.skipped += 1;
            continue;
        }

        let annotation = match Annotation::load(&path) {
            Ok(a) => a,
            Err(e) => {
                report.fail(FailureClass::BadMask, &map_id, config, e.to_string());
                continue;
            }
        };
        match warp_one(&annotation, layout, config, toolkit, reprojector) {
            Ok(RectifyOutcome::Warped) => report.processed += 1,
            Ok(RectifyOutcome::Skipped) => report.skipped += 1,
            Err(e) => report.fail(e.failure_class(), &map_id, config, e.to_string()),
        }
    }
    report.failures.finish(&layout.failure_report())?;
    report.log_summary("Warp");
    Ok(report)
}

fn warp_one(
    annotation: &Annotation,
    layout: &StagingLayout,
    config: &PipelineConfig,
    toolkit: &dyn RasterToolkit,
    reprojector: &dyn Reproject,
) -> std::result::Result<RectifyOutcome, RectifyError> {
    let gcps = extract_gcps(&annotation.gcp_features, &config.gcp, reprojector)?;
    validate_fit(&gcps, config.gcp.min_points)?;

    let map_id = annotation.map_id.as_str();
    let source = layout.image(&config.image_key.key_for(&annotation.source));
    let intermediate = layout.intermediate(map_id);
    let output = layout.warped_plate(map_id);
    let cutline = layout.cutline(map_id);
    let job = PlateJob {
        map_id,
        source: &source,
        intermediate: &intermediate,
        output: &output,
        cutline: &cutline,
        gcps: &gcps,
    };
    rectify_plate(&job, config, toolkit)
}

fn plate_id_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build `output/mosaic.vrt` over the warped plates.
///
/// The order file (default `tmp/mosaic-order.txt`) wins when present;
/// otherwise plates are ordered by `comparator`. Relative entries of the order
/// file are taken from the work directory and must exist. The order used is
/// written to `output/mosaic-order.txt` and handed to the VRT builder.
pub fn mosaic_plates(
    layout: &StagingLayout,
    config: &PipelineConfig,
    toolkit: &dyn RasterToolkit,
    order_file: Option<&Path>,
    comparator: &dyn PlateComparator,
) -> Result<MergeOrder> {
    let explicit = order_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| layout.explicit_order());
    let order = match resolve_merge_order(&layout.warped(), &explicit, comparator)? {
        MergeOrder::Explicit(paths) => {
            let paths = anchor_paths(paths, layout.root());
            if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
                return Err(Error::MissingInput(missing.clone()));
            }
            MergeOrder::Explicit(paths)
        }
        computed => computed,
    };
    if order.paths().is_empty() {
        return Err(Error::MissingInput(layout.warped()));
    }
    for (idx, path) in order.paths().iter().enumerate() {
        info!("{:>4}  {:?}", idx, path);
    }

    let list = layout.mosaic_order();
    write_order_file(&list, order.paths())?;
    info!("Building VRT {:?}", layout.mosaic_vrt());
    toolkit.build_vrt(&VrtRequest {
        input_list: &list,
        output: &layout.mosaic_vrt(),
        target_crs: &config.target_crs,
        options: &config.vrt,
    })?;
    Ok(order)
}

/// Cut the mosaic VRT into an XYZ tile pyramid under `output/tiles`
pub fn create_xyz(
    layout: &StagingLayout,
    config: &PipelineConfig,
    toolkit: &dyn RasterToolkit,
) -> Result<()> {
    let vrt = layout.mosaic_vrt();
    if !vrt.exists() {
        return Err(Error::MissingInput(vrt));
    }
    info!(
        "Creating XYZ tiles (zoom {}-{}) in {:?}",
        config.tiles.min_zoom,
        config.tiles.max_zoom,
        layout.tiles()
    );
    toolkit.export_tiles(&TileRequest {
        source: &vrt,
        output_dir: &layout.tiles(),
        log: &layout.tiles_log(),
        options: &config.tiles,
    })?;
    info!("Tiler output written to {:?}", layout.tiles_log());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cutline::fixtures::square;
    use crate::core::gcp::testing::ScaleReprojector;
    use crate::core::mosaic::LargestFirst;
    use crate::core::rectify::testing::FakeToolkit;
    use crate::io::annotation::fixtures::{annotation_json, four_points};
    use crate::io::fetch::testing::FakeService;
    use serde_json::Value;

    const CATALOG: &str = "cat1";
    const SOURCE: &str = "https://iiif.example/2/plate-a";

    struct Workdir {
        _dir: tempfile::TempDir,
        layout: StagingLayout,
        config: PipelineConfig,
    }

    fn workdir() -> Workdir {
        let dir = tempfile::tempdir().unwrap();
        let layout = StagingLayout::new(dir.path());
        layout.ensure().unwrap();
        Workdir {
            _dir: dir,
            layout,
            config: PipelineConfig::default(),
        }
    }

    fn annotation_value(points: &[((f64, f64), (f64, f64))]) -> Value {
        serde_json::from_str(&annotation_json(SOURCE, "resourceCoords", points)).unwrap()
    }

    /// Service publishing one map `m1` whose source is `SOURCE`
    fn service(config: &PipelineConfig) -> FakeService {
        let ep = &config.endpoints;
        let mut svc = FakeService::default();
        svc.json.insert(
            ep.annotation_index_url(CATALOG),
            serde_json::json!({ "items": [ { "id": "https://annotations.allmaps.org/maps/m1" } ] }),
        );
        svc.json
            .insert(ep.map_annotation_url("m1"), annotation_value(&four_points()));
        svc.blobs
            .insert(ep.image_download_url(SOURCE), b"raster bytes".to_vec());
        svc
    }

    fn mask_toolkit() -> FakeToolkit {
        FakeToolkit {
            mask_output: Some(GeoJson::Geometry(square(-7_910_000.0, 5_215_000.0, 500.0)).to_string()),
            ..FakeToolkit::default()
        }
    }

    #[test]
    fn download_persists_annotation_image_and_tileset() {
        let w = workdir();
        let svc = service(&w.config);
        let report = download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        assert_eq!(
            report,
            DownloadReport {
                annotations: 1,
                images_downloaded: 1,
                images_skipped: 0,
                tileset_written: true,
            }
        );
        assert!(w.layout.annotation("m1").exists());
        assert_eq!(std::fs::read(w.layout.image("plate-a")).unwrap(), b"raster bytes");
        assert!(w.layout.tileset().exists());
    }

    #[test]
    fn second_download_fetches_only_missing_images() {
        let w = workdir();
        let mut svc = service(&w.config);
        download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        std::fs::write(w.layout.image("plate-a"), b"local edit").unwrap();

        // A second map on a new source appears upstream
        let ep = w.config.endpoints.clone();
        svc.json.insert(
            ep.annotation_index_url(CATALOG),
            serde_json::json!({ "items": [ { "id": "m1" }, { "id": "m2" } ] }),
        );
        let other: Value = serde_json::from_str(&annotation_json(
            "https://iiif.example/2/plate-b",
            "resourceCoords",
            &four_points(),
        ))
        .unwrap();
        svc.json.insert(ep.map_annotation_url("m2"), other);
        svc.blobs.insert(
            ep.image_download_url("https://iiif.example/2/plate-b"),
            b"b bytes".to_vec(),
        );
        svc.requests.borrow_mut().clear();

        let report = download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        assert_eq!(report.images_downloaded, 1);
        assert_eq!(report.images_skipped, 1);
        assert!(!report.tileset_written);
        assert_eq!(std::fs::read(w.layout.image("plate-a")).unwrap(), b"local edit");
        assert!(w.layout.image("plate-b").exists());
        let downloads: Vec<String> = svc
            .requests
            .borrow()
            .iter()
            .filter(|u| u.ends_with(".tif"))
            .cloned()
            .collect();
        assert_eq!(
            downloads,
            vec![ep.image_download_url("https://iiif.example/2/plate-b")]
        );
    }

    #[test]
    fn full_pipeline_yields_one_warped_plate_and_no_intermediate() {
        let w = workdir();
        let svc = service(&w.config);
        let tk = mask_toolkit();

        download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        let masks = transform_masks(&w.layout, &w.config, &svc, &tk).unwrap();
        assert_eq!(masks.processed, 1);
        assert!(w.layout.plate_index().exists());
        assert!(w.layout.footprint().exists());

        let warped = warp_plates(&w.layout, &w.config, &tk, &ScaleReprojector).unwrap();
        assert_eq!((warped.processed, warped.errors), (1, 0));
        let outputs = list_files(&w.layout.warped(), "tif").unwrap();
        assert_eq!(outputs, vec![w.layout.warped_plate("m1")]);
        assert!(!w.layout.intermediate("m1").exists());
        assert!(!w.layout.failure_report().exists());

        let order = mosaic_plates(&w.layout, &w.config, &tk, None, &LargestFirst).unwrap();
        assert_eq!(order, MergeOrder::Computed(vec![w.layout.warped_plate("m1")]));
        create_xyz(&w.layout, &w.config, &tk).unwrap();
        assert_eq!(
            tk.calls(),
            vec!["transform_pixel_mask", "tag", "warp", "build_vrt", "export_tiles"]
        );
    }

    #[test]
    fn rerunning_warp_invokes_no_tools() {
        let w = workdir();
        let svc = service(&w.config);
        download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        std::fs::write(w.layout.warped_plate("m1"), b"done").unwrap();
        let tk = FakeToolkit::default();
        let report = warp_plates(&w.layout, &w.config, &tk, &ScaleReprojector).unwrap();
        assert_eq!(report.skipped, 1);
        assert!(tk.calls().is_empty());
    }

    #[test]
    fn two_gcps_are_recorded_and_never_warped() {
        let w = workdir();
        let mut svc = service(&w.config);
        let all = four_points();
        svc.json.insert(
            w.config.endpoints.map_annotation_url("m1"),
            annotation_value(&all[..2]),
        );
        let tk = mask_toolkit();
        download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();
        transform_masks(&w.layout, &w.config, &svc, &tk).unwrap();

        let report = warp_plates(&w.layout, &w.config, &tk, &ScaleReprojector).unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.failures.count(FailureClass::InsufficientPoints), 1);
        let failure = &report.failures.entries()[0];
        assert_eq!(failure.plate_id, "m1");
        assert!(failure.remediation_url.ends_with("/maps/m1"));
        assert!(!tk.calls().contains(&"tag".to_string()));
        assert!(!w.layout.warped_plate("m1").exists());
        assert!(w.layout.failure_report().exists());
    }

    #[test]
    fn restart_manifest_limits_mask_transform_to_failed_plates() {
        let w = workdir();
        let mut svc = service(&w.config);
        let ep = w.config.endpoints.clone();
        svc.json.insert(
            ep.annotation_index_url(CATALOG),
            serde_json::json!({ "items": [ { "id": "m1" }, { "id": "m2" } ] }),
        );
        svc.json.insert(ep.map_annotation_url("m2"), annotation_value(&four_points()));
        download_inputs(CATALOG, &w.layout, &w.config, &svc).unwrap();

        let mut failures = FailureReport::new();
        failures.record(FailureClass::NoCutline, "m2", ep.map_editor_url("m2"), "empty");
        failures.write_csv(&w.layout.failure_report()).unwrap();
        svc.requests.borrow_mut().clear();

        let tk = mask_toolkit();
        let report = transform_masks(&w.layout, &w.config, &svc, &tk).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(*svc.requests.borrow(), vec![ep.map_annotation_url("m2")]);
        assert!(w.layout.cutline("m2").exists());
        assert!(!w.layout.cutline("m1").exists());
        assert!(!w.layout.failure_report().exists());
    }

    #[test]
    fn explicit_order_file_is_resolved_against_the_workdir() {
        let w = workdir();
        assert_ne!(std::env::current_dir().unwrap(), w.layout.root());
        std::fs::write(w.layout.warped_plate("a"), vec![0u8; 10]).unwrap();
        std::fs::write(w.layout.warped_plate("b"), vec![0u8; 20]).unwrap();
        let order_file = w.layout.root().join("order.txt");
        std::fs::write(&order_file, "tmp/warped/a-warped.tif\ntmp/warped/b-warped.tif\n").unwrap();
        let tk = FakeToolkit::default();
        let order =
            mosaic_plates(&w.layout, &w.config, &tk, Some(&order_file), &LargestFirst).unwrap();
        let expected = vec![w.layout.warped_plate("a"), w.layout.warped_plate("b")];
        assert_eq!(order, MergeOrder::Explicit(expected.clone()));
        let listed: Vec<PathBuf> = tk.vrt_inputs.borrow().iter().map(PathBuf::from).collect();
        assert_eq!(listed, expected);
        assert!(w.layout.mosaic_order().exists());
    }

    #[test]
    fn order_file_naming_a_missing_plate_is_an_error() {
        let w = workdir();
        std::fs::write(w.layout.warped_plate("a"), vec![0u8; 10]).unwrap();
        let order_file = w.layout.root().join("order.txt");
        std::fs::write(&order_file, "tmp/warped/a-warped.tif\ntmp/warped/gone-warped.tif\n").unwrap();
        let tk = FakeToolkit::default();
        let err = mosaic_plates(&w.layout, &w.config, &tk, Some(&order_file), &LargestFirst)
            .unwrap_err();
        let Error::MissingInput(path) = err else {
            panic!("expected MissingInput, got {:?}", err);
        };
        assert_eq!(path, w.layout.warped_plate("gone"));
        assert!(tk.calls().is_empty());
    }

    #[test]
    fn mosaic_without_plates_is_an_error() {
        let w = workdir();
        let err = mosaic_plates(&w.layout, &w.config, &FakeToolkit::default(), None, &LargestFirst)
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn tiles_require_the_vrt() {
        let w = workdir();
        let err = create_xyz(&w.layout, &w.config, &FakeToolkit::default()).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn check_flags_unreadable_images_and_missing_sources() {
        let w = workdir();
        std::fs::write(w.layout.image("garbage"), b"not a tiff").unwrap();
        std::fs::write(w.layout.intermediate("m9"), b"ignored").unwrap();
        std::fs::write(w.layout.annotation("m1"), annotation_json(SOURCE, "resourceCoords", &four_points()))
            .unwrap();
        let check = check_inputs(&w.layout, &w.config).unwrap();
        assert_eq!(check.images_checked, 1);
        assert_eq!(check.unreadable, vec![w.layout.image("garbage")]);
        assert_eq!(
            check.missing_sources,
            vec![("m1".to_string(), w.layout.image("plate-a"))]
        );
        assert!(!check.is_clean());
    }

    #[test]
    fn check_reports_band_count() {
        use gdal::DriverManager;
        let w = workdir();
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        driver
            .create_with_band_type::<u8, _>(w.layout.image("gray"), 4, 4, 1)
            .unwrap();
        driver
            .create_with_band_type::<u8, _>(w.layout.image("rgb"), 4, 4, 3)
            .unwrap();
        let check = check_inputs(&w.layout, &w.config).unwrap();
        assert_eq!(check.images_checked, 2);
        assert_eq!(check.unexpected_bands, vec![(w.layout.image("gray"), 1)]);
        assert!(check.unreadable.is_empty());
    }
}
