//! External command-line tools the pipeline drives.
//!
//! Each request type renders its own argument list so the exact invocation is
//! testable without the tools installed. `GdalCommandLine` runs them as
//! subprocesses; tests substitute their own `RasterToolkit`.
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::core::gcp::GroundControlPoint;
use crate::core::params::{TagOptions, TileOptions, ToolPaths, VrtOptions, WarpOptions};

/// Errors raised while running an external tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("failed to capture output of {tool} into {path:?}: {source}")]
    Capture {
        tool: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Attach GCPs and a CRS to a raster without resampling
#[derive(Debug, Clone)]
pub struct TagRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub gcps: &'a [GroundControlPoint],
    pub target_crs: &'a str,
    pub options: &'a TagOptions,
}

impl TagRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-of".to_string(),
            self.options.format.clone(),
            "-a_srs".to_string(),
            self.target_crs.to_string(),
        ];
        for gcp in self.gcps {
            args.push("-gcp".to_string());
            args.push(gcp.pixel.to_string());
            args.push(gcp.line.to_string());
            args.push(gcp.target.0.to_string());
            args.push(gcp.target.1.to_string());
        }
        args.push(path_arg(self.source));
        args.push(path_arg(self.output));
        args
    }
}

/// Resample a tagged raster into the target CRS
#[derive(Debug, Clone)]
pub struct WarpRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub target_crs: &'a str,
    pub cutline: Option<&'a Path>,
    pub options: &'a WarpOptions,
}

impl WarpRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let o = self.options;
        let mut args = vec![
            "-overwrite".to_string(),
            "-of".to_string(),
            o.format.clone(),
            "-t_srs".to_string(),
            self.target_crs.to_string(),
            "-r".to_string(),
            o.resampling.as_gdal().to_string(),
            "-tr".to_string(),
            o.resolution.0.to_string(),
            o.resolution.1.to_string(),
        ];
        if o.target_aligned_pixels {
            args.push("-tap".to_string());
        }
        if let Some(order) = o.polynomial_order {
            args.push("-order".to_string());
            args.push(order.to_string());
        }
        if o.dst_alpha {
            args.push("-dstalpha".to_string());
        }
        if let Some(nodata) = o.dst_nodata {
            args.push("-dstnodata".to_string());
            args.push(nodata.to_string());
        }
        if !o.copy_metadata {
            args.push("-nomd".to_string());
        }
        if o.multithread {
            args.push("-multi".to_string());
        }
        for co in &o.creation_options {
            args.push("-co".to_string());
            args.push(co.clone());
        }
        if let Some(cutline) = self.cutline {
            args.push("-cutline".to_string());
            args.push(path_arg(cutline));
            if o.crop_to_cutline {
                args.push("-crop_to_cutline".to_string());
            }
        }
        args.push(path_arg(self.source));
        args.push(path_arg(self.output));
        args
    }
}

/// Build a virtual composite over an ordered list of rasters
#[derive(Debug, Clone)]
pub struct VrtRequest<'a> {
    /// Text file with one input per line, in merge order
    pub input_list: &'a Path,
    pub output: &'a Path,
    pub target_crs: &'a str,
    pub options: &'a VrtOptions,
}

impl VrtRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let o = self.options;
        let mut args = vec![
            "-overwrite".to_string(),
            "-resolution".to_string(),
            o.resolution.as_gdal().to_string(),
            "-a_srs".to_string(),
            self.target_crs.to_string(),
        ];
        if o.separate {
            args.push("-separate".to_string());
        }
        if let Some(nodata) = o.src_nodata {
            args.push("-srcnodata".to_string());
            args.push(nodata.to_string());
        }
        args.push("-input_file_list".to_string());
        args.push(path_arg(self.input_list));
        args.push(path_arg(self.output));
        args
    }
}

/// Cut a raster into an XYZ tile pyramid
#[derive(Debug, Clone)]
pub struct TileRequest<'a> {
    pub source: &'a Path,
    pub output_dir: &'a Path,
    /// Where the tiler's standard output is written
    pub log: &'a Path,
    pub options: &'a TileOptions,
}

impl TileRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let o = self.options;
        let mut args = vec![
            "--xyz".to_string(),
            "-z".to_string(),
            format!("{}-{}", o.min_zoom, o.max_zoom),
        ];
        if o.exclude_transparent {
            args.push("--exclude".to_string());
        }
        if !o.webviewer {
            args.push("--webviewer=none".to_string());
        }
        args.push(format!("--processes={}", o.processes));
        args.push(path_arg(self.source));
        args.push(path_arg(self.output_dir));
        args
    }
}

/// The raster and geometry operations the pipeline delegates to external tools
pub trait RasterToolkit {
    fn tag(&self, request: &TagRequest<'_>) -> Result<(), ToolError>;
    fn warp(&self, request: &WarpRequest<'_>) -> Result<(), ToolError>;
    fn build_vrt(&self, request: &VrtRequest<'_>) -> Result<(), ToolError>;
    fn export_tiles(&self, request: &TileRequest<'_>) -> Result<(), ToolError>;
    /// Transform an annotation's pixel mask into a GeoJSON polygon written to `output`
    fn transform_pixel_mask(&self, annotation: &Path, output: &Path) -> Result<(), ToolError>;
}

/// `RasterToolkit` backed by the GDAL command-line utilities and the Allmaps CLI
#[derive(Debug, Clone, Default)]
pub struct GdalCommandLine {
    pub tools: ToolPaths,
}

impl GdalCommandLine {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn run(&self, tool: &str, args: &[String], stdout_to: Option<&Path>) -> Result<(), ToolError> {
        debug!("Running {} {}", tool, args.join(" "));
        let mut cmd = Command::new(tool);
        cmd.args(args).stderr(Stdio::piped());
        match stdout_to {
            Some(path) => {
                let file = File::create(path).map_err(|e| ToolError::Capture {
                    tool: tool.to_string(),
                    path: path.to_path_buf(),
                    source: e,
                })?;
                cmd.stdout(Stdio::from(file));
            }
            None => {
                cmd.stdout(Stdio::null());
            }
        }
        let output = cmd.output().map_err(|e| ToolError::Spawn {
            tool: tool.to_string(),
            source: e,
        })?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl RasterToolkit for GdalCommandLine {
    fn tag(&self, request: &TagRequest<'_>) -> Result<(), ToolError> {
        self.run(&self.tools.gdal_translate, &request.args(), None)
    }

    fn warp(&self, request: &WarpRequest<'_>) -> Result<(), ToolError> {
        self.run(&self.tools.gdalwarp, &request.args(), None)
    }

    fn build_vrt(&self, request: &VrtRequest<'_>) -> Result<(), ToolError> {
        self.run(&self.tools.gdalbuildvrt, &request.args(), None)
    }

    fn export_tiles(&self, request: &TileRequest<'_>) -> Result<(), ToolError> {
        self.run(&self.tools.gdal2tiles, &request.args(), Some(request.log))
    }

    fn transform_pixel_mask(&self, annotation: &Path, output: &Path) -> Result<(), ToolError> {
        let args = vec![
            "transform".to_string(),
            "pixel-mask".to_string(),
            path_arg(annotation),
        ];
        let result = self.run(&self.tools.allmaps, &args, Some(output));
        if result.is_err() {
            // Partial stdout would otherwise read as an empty cutline later
            let _ = std::fs::remove_file(output);
        }
        result
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
