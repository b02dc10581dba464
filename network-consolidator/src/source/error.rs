//! Source loading errors.

use std::path::PathBuf;

/// Errors from reading batch files.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid batch
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
