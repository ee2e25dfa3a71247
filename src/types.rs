//! Shared types and enums used across platewarp.
//! Includes the pipeline `Step`, resampling and VRT resolution choices, and the
//! `FailureClass` buckets used by the failure report.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Pipeline stage selected with `--step`
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Step {
    DownloadInputs,
    CheckInputs,
    #[value(alias = "mask-transform")]
    AllmapsTransform,
    WarpPlates,
    MosaicPlates,
    CreateXyz,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::DownloadInputs => "download-inputs",
            Step::CheckInputs => "check-inputs",
            Step::AllmapsTransform => "allmaps-transform",
            Step::WarpPlates => "warp-plates",
            Step::MosaicPlates => "mosaic-plates",
            Step::CreateXyz => "create-xyz",
        };
        write!(f, "{}", s)
    }
}

/// Resampling kernel handed to `gdalwarp -r`
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleKernel {
    Near,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
}

impl ResampleKernel {
    pub fn as_gdal(&self) -> &'static str {
        match self {
            ResampleKernel::Near => "near",
            ResampleKernel::Bilinear => "bilinear",
            ResampleKernel::Cubic => "cubic",
            ResampleKernel::CubicSpline => "cubicspline",
            ResampleKernel::Lanczos => "lanczos",
        }
    }
}

/// How `gdalbuildvrt` picks the output resolution over overlapping sources
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    Highest,
    Lowest,
    Average,
}

impl ResolutionStrategy {
    pub fn as_gdal(&self) -> &'static str {
        match self {
            ResolutionStrategy::Highest => "highest",
            ResolutionStrategy::Lowest => "lowest",
            ResolutionStrategy::Average => "average",
        }
    }
}

/// Remediation bucket for a per-plate failure
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureClass {
    /// Fewer than the minimum number of usable, non-collinear GCPs
    InsufficientPoints,
    /// Mask or cutline geometry is topologically invalid
    InvalidMask,
    /// Cutline missing or without any features to clip against
    NoCutline,
    /// Any other rectification failure
    BadMask,
    /// Source raster for the plate was never downloaded
    MissingSource,
}

impl FailureClass {
    /// Headline printed above the bucket in the console table
    pub fn remediation(&self) -> &'static str {
        match self {
            FailureClass::InsufficientPoints => "fix maps with insufficient points",
            FailureClass::InvalidMask => "fix maps with invalid masks",
            FailureClass::NoCutline => "fix maps with no cutline features",
            FailureClass::BadMask => "fix maps with bad masks",
            FailureClass::MissingSource => "re-download missing source images",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureClass::InsufficientPoints => write!(f, "insufficient-points"),
            FailureClass::InvalidMask => write!(f, "invalid-mask"),
            FailureClass::NoCutline => write!(f, "no-cutline"),
            FailureClass::BadMask => write!(f, "bad-mask"),
            FailureClass::MissingSource => write!(f, "missing-source"),
        }
    }
}
