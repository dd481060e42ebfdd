//! Error types for template loading

use crate::path::PathError;
use std::path::PathBuf;

/// Errors raised while loading a template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Document is not valid JSON or does not match the question shape
    #[error("template parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// No `<entity>Template` root key
    #[error("template root key '<entity>Template' not found")]
    MissingRoot,

    /// Empty or malformed qid
    #[error("invalid qid '{qid}': {source}")]
    InvalidQid {
        qid: String,
        #[source]
        source: PathError,
    },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
