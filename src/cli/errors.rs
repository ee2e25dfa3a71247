use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Could not load config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: platewarp::Error,
    },

    #[error("{problems} input problem(s) found; re-run download-inputs or fix the listed files")]
    InputsIncomplete { problems: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] platewarp::Error),
}
