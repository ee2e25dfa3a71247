#![doc = r#"
platewarp: georeference historical atlas plates and publish them as XYZ tiles.

This crate drives the whole pipeline from a catalog identifier to a web tileset:
fetch georeference annotations and source scans, turn each plate's pixel mask
into a cutline, tag and warp every plate into a common CRS with its ground
control points, merge the plates into a virtual mosaic and cut it into tiles.
Geometric work (warping, resampling, compositing, tiling) is done by the GDAL
command-line tools; platewarp computes their parameters, ordering and
bookkeeping, and keeps a restart manifest of plates that need manual fixes.

Stability
---------
The public library API is experimental in initial releases and may evolve.
Breaking changes can occur.

Requirements
------------
- GDAL development headers and runtime available on your system.
- `gdal_translate`, `gdalwarp`, `gdalbuildvrt` and `gdal2tiles.py` on `PATH`.
- The `allmaps` CLI for the mask-transform step.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
platewarp = "0.1"
```

Quick start: run every step for one atlas
-----------------------------------------
```rust,no_run
use platewarp::api::{
    create_xyz, download_inputs, mosaic_plates, transform_masks, warp_plates,
};
use platewarp::core::layout::StagingLayout;
use platewarp::core::mosaic::LargestFirst;
use platewarp::io::fetch::HttpAnnotationService;
use platewarp::{GdalCommandLine, GdalReprojector, PipelineConfig};

fn main() -> platewarp::Result<()> {
    let config = PipelineConfig::default();
    let layout = StagingLayout::new("/data/atlas");
    let service = HttpAnnotationService::new()?;
    let toolkit = GdalCommandLine::new(config.tools.clone());
    let reprojector = GdalReprojector::new(&config.source_crs, &config.target_crs)?;

    download_inputs("6969zf42z", &layout, &config, &service)?;
    transform_masks(&layout, &config, &service, &toolkit)?;
    let report = warp_plates(&layout, &config, &toolkit, &reprojector)?;
    println!(
        "warped={} skipped={} errors={}",
        report.processed, report.skipped, report.errors
    );
    mosaic_plates(&layout, &config, &toolkit, None, &LargestFirst)?;
    create_xyz(&layout, &config, &toolkit)
}
```

Per-plate failures
------------------
Steps that process plates never abort on a single bad plate. Each failure is
recorded in the returned `BatchReport` under a `FailureClass` with a link to
the georeference editor, printed as a table and persisted to
`tmp/failures.csv`. The next mask-transform run re-fetches only those plates.

```rust,no_run
use platewarp::api::warp_plates;
use platewarp::core::layout::StagingLayout;
use platewarp::{FailureClass, GdalCommandLine, GdalReprojector, PipelineConfig};

fn main() -> platewarp::Result<()> {
    let config = PipelineConfig::default();
    let layout = StagingLayout::new(".");
    let toolkit = GdalCommandLine::new(config.tools.clone());
    let reprojector = GdalReprojector::new(&config.source_crs, &config.target_crs)?;

    let report = warp_plates(&layout, &config, &toolkit, &reprojector)?;
    for failure in report.failures.entries() {
        if failure.class == FailureClass::InsufficientPoints {
            println!("add points: {}", failure.remediation_url);
        }
    }
    Ok(())
}
```

Error handling
--------------
All public step functions return `platewarp::Result<T>`; match on `platewarp::Error`
to handle specific cases, e.g. an atlas nobody has georeferenced yet.

```rust,no_run
use platewarp::api::download_inputs;
use platewarp::core::layout::StagingLayout;
use platewarp::io::fetch::HttpAnnotationService;
use platewarp::{Error, PipelineConfig};

fn main() {
    let config = PipelineConfig::default();
    let layout = StagingLayout::new(".");
    let service = match HttpAnnotationService::new() {
        Ok(s) => s,
        Err(e) => return eprintln!("{e}"),
    };
    match download_inputs("6969zf42z", &layout, &config, &service) {
        Ok(report) => println!("{} annotation(s)", report.annotations),
        Err(Error::NoGeoreferenceAnnotations { remediation, .. }) => {
            eprintln!("start georeferencing at {remediation}")
        }
        Err(Error::Http(e)) => eprintln!("network error: {e}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`]: one entry point per pipeline step.
- [`core`]: configuration, layout, GCPs, cutlines, rectification, mosaic order, reports.
- [`io`]: annotations, remote services, GDAL adapters, external tools, writers.
- [`types`]: `Step`, `FailureClass` and tool option enums.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::PipelineConfig;
pub use error::{Error, Result};
pub use types::{FailureClass, ResampleKernel, ResolutionStrategy, Step};

// GDAL and external tools
pub use io::gdal::{GdalError, GdalReprojector, RasterInfo};
pub use io::tools::{GdalCommandLine, RasterToolkit, ToolError};

// High-level API re-exports
pub use api::{
    BatchReport, DownloadReport, InputCheck, check_inputs, create_xyz, download_inputs,
    mosaic_plates, transform_masks, warp_plates,
};
