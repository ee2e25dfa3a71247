//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, JSON, CSV, HTTP, GDAL and external-tool errors, and
//! provides semantic variants for batch-level failures that abort a step.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("{0}")]
    Tool(#[from] crate::io::ToolError),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error(
        "Manifest {identifier} contains no georeference annotations. Begin georeferencing it at: {remediation}"
    )]
    NoGeoreferenceAnnotations {
        identifier: String,
        remediation: String,
    },

    #[error("Malformed annotation {path:?}: {reason}")]
    MalformedAnnotation { path: PathBuf, reason: String },

    #[error("Missing input: {0:?}")]
    MissingInput(PathBuf),

    #[error("Processing error: {0}")]
    Processing(String),
}
