//! Command Line Interface (CLI) layer for platewarp.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the step dispatch (`runner`). Each `--step` maps onto one function of
//! `platewarp::api`, wired to the production HTTP service, GDAL command-line
//! tools and GDAL/PROJ reprojection.
//!
//! If you are embedding platewarp into another application, prefer using
//! the high-level `platewarp::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
