//! Fixed staging and output directory tree under a work directory.
use std::path::{Path, PathBuf};

use tracing::debug;

/// Paths used by every pipeline step, rooted at the work directory.
///
/// ```text
/// tmp/img/                      raw source rasters, tagged intermediates
/// tmp/annotations/              <map_id>.json
/// tmp/annotations/transformed/  <map_id>-transformed.geojson cutlines
/// tmp/warped/                   <map_id>-warped.tif
/// output/                       mosaic.vrt, footprint and plate index, tiles/
/// ```
#[derive(Debug, Clone)]
pub struct StagingLayout {
    root: PathBuf,
}

impl StagingLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create every directory of the tree that does not exist yet
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            self.images(),
            self.annotations(),
            self.transformed(),
            self.warped(),
            self.output(),
        ] {
            if !dir.is_dir() {
                debug!("Creating directory {:?}", dir);
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn images(&self) -> PathBuf {
        self.tmp().join("img")
    }

    pub fn annotations(&self) -> PathBuf {
        self.tmp().join("annotations")
    }

    pub fn transformed(&self) -> PathBuf {
        self.annotations().join("transformed")
    }

    pub fn warped(&self) -> PathBuf {
        self.tmp().join("warped")
    }

    pub fn output(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn tiles(&self) -> PathBuf {
        self.output().join("tiles")
    }

    pub fn mosaic_vrt(&self) -> PathBuf {
        self.output().join("mosaic.vrt")
    }

    /// Merge order actually used for the last mosaic
    pub fn mosaic_order(&self) -> PathBuf {
        self.output().join("mosaic-order.txt")
    }

    /// Operator-supplied merge order; bypasses size ordering when present
    pub fn explicit_order(&self) -> PathBuf {
        self.tmp().join("mosaic-order.txt")
    }

    pub fn footprint(&self) -> PathBuf {
        self.output().join("footprint.geojson")
    }

    pub fn plate_index(&self) -> PathBuf {
        self.output().join("plates.geojson")
    }

    pub fn tileset(&self) -> PathBuf {
        self.output().join("tileset.json")
    }

    pub fn tiles_log(&self) -> PathBuf {
        self.output().join("create-xyz.log")
    }

    /// Restart manifest of the last run's failures
    pub fn failure_report(&self) -> PathBuf {
        self.tmp().join("failures.csv")
    }

    pub fn annotation(&self, map_id: &str) -> PathBuf {
        self.annotations().join(format!("{}.json", map_id))
    }

    pub fn image(&self, image_key: &str) -> PathBuf {
        self.images().join(format!("{}.tif", image_key))
    }

    pub fn intermediate(&self, map_id: &str) -> PathBuf {
        self.images().join(format!("{}-translated.tif", map_id))
    }

    pub fn warped_plate(&self, map_id: &str) -> PathBuf {
        self.warped().join(format!("{}-warped.tif", map_id))
    }

    pub fn cutline(&self, map_id: &str) -> PathBuf {
        self.transformed()
            .join(format!("{}-transformed.geojson", map_id))
    }

    /// Persisted annotations, sorted by file name, skipping dotfiles
    pub fn annotation_files(&self) -> std::io::Result<Vec<PathBuf>> {
        list_files(&self.annotations(), "json")
    }
}

/// Regular files in `dir` with extension `ext`, sorted, skipping dotfiles
pub fn list_files(dir: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_none_or(|n| n.starts_with('.'));
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if path.is_file() && !hidden && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
