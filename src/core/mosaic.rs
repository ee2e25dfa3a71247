//! Merge ordering for the virtual mosaic.
//!
//! Inputs listed first sit at the bottom of the composite; later inputs draw
//! over them. An explicit order file wins outright. Otherwise the warped
//! plates are sorted with a `PlateComparator`, by default largest file first
//! (file size standing in for geographic footprint, so smaller and more
//! detailed plates end up on top).
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::layout::list_files;

/// A warped raster considered for the mosaic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Ordering strategy for computed merge orders
pub trait PlateComparator {
    fn compare(&self, a: &PlateFile, b: &PlateFile) -> Ordering;
}

/// Descending byte size; ties broken by path so the order is deterministic
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestFirst;

impl PlateComparator for LargestFirst {
    fn compare(&self, a: &PlateFile, b: &PlateFile) -> Ordering {
        b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path))
    }
}

/// Where a merge order came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOrder {
    Explicit(Vec<PathBuf>),
    Computed(Vec<PathBuf>),
}

impl MergeOrder {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            MergeOrder::Explicit(p) | MergeOrder::Computed(p) => p,
        }
    }
}

/// Every `.tif` in `dir` with its byte size
pub fn list_plates(dir: &Path) -> std::io::Result<Vec<PlateFile>> {
    let mut plates = Vec::new();
    for path in list_files(dir, "tif")? {
        let size = std::fs::metadata(&path)?.len();
        plates.push(PlateFile { path, size });
    }
    Ok(plates)
}

pub fn sort_plates(mut plates: Vec<PlateFile>, comparator: &dyn PlateComparator) -> Vec<PlateFile> {
    plates.sort_by(|a, b| comparator.compare(a, b));
    plates
}

/// Non-blank lines of an order file, trimmed, in file order
pub fn read_order_file(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Resolve relative order entries against `root`, keeping their order.
/// Absolute entries are kept as written.
pub fn anchor_paths(paths: Vec<PathBuf>, root: &Path) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|p| if p.is_absolute() { p } else { root.join(p) })
        .collect()
}

/// Decide the merge order: the explicit order file verbatim if it exists,
/// otherwise the plates of `warped_dir` sorted by `comparator`.
pub fn resolve_merge_order(
    warped_dir: &Path,
    order_file: &Path,
    comparator: &dyn PlateComparator,
) -> std::io::Result<MergeOrder> {
    if order_file.is_file() {
        info!("Using explicit merge order from {:?}", order_file);
        return Ok(MergeOrder::Explicit(read_order_file(order_file)?));
    }
    let plates = sort_plates(list_plates(warped_dir)?, comparator);
    for p in &plates {
        debug!("{:>12} bytes  {:?}", p.size, p.path);
    }
    Ok(MergeOrder::Computed(
        plates.into_iter().map(|p| p.path).collect(),
    ))
}

/// Write an order as one path per line (the `-input_file_list` format)
pub fn write_order_file(path: &Path, order: &[PathBuf]) -> std::io::Result<()> {
    let mut text = String::new();
    for p in order {
        text.push_str(&p.to_string_lossy());
        text.push('\n');
    }
    std::fs::write(path, text)
}
