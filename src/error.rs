use std::path::PathBuf;
use thiserror::Error;

/// The main error type for timemark operations.
#[derive(Debug, Error)]
pub enum TimemarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse KML from {path}: {message}")]
    KmlParse { path: PathBuf, message: String },

    #[error("Failed to write item JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
