//! Engine error types
//!
//! [`FieldError`] stays inside the per-field boundary and becomes a report
//! row. [`EngineError`] is what escapes a run.

use formprobe_driver::DriverError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while processing one field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    /// No candidate locator matched a present, visible, enabled control
    #[error("could not find field: {qid}")]
    NotFound {
        /// Field key
        qid: String,
    },

    /// Surface call failed
    #[error("{qid}: {source}")]
    Driver {
        /// Field key
        qid: String,
        /// Underlying driver error
        #[source]
        source: DriverError,
    },

    /// Choice panel offered nothing selectable
    #[error("empty mapping: no selectable options after {attempts} filter attempts")]
    EmptyMapping {
        /// Field key
        qid: String,
        /// Filter keystrokes probed
        attempts: usize,
    },

    /// Read-back did not match the written value
    #[error("verification failed: expected {expected:?}, read {actual:?}")]
    VerificationFailed {
        /// Field key
        qid: String,
        /// Value written
        expected: String,
        /// Value read back
        actual: String,
    },

    /// Numeric control kept alphabetic characters after sanitising
    #[error("numeric value leaked alphabetic characters: {actual:?}")]
    NumericLeak {
        /// Field key
        qid: String,
        /// Value read back
        actual: String,
    },
}

impl FieldError {
    /// Wrap a driver error for a field
    #[must_use]
    pub fn driver(qid: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            qid: qid.into(),
            source,
        }
    }

    /// Field key this error belongs to
    #[must_use]
    pub fn qid(&self) -> &str {
        match self {
            Self::NotFound { qid }
            | Self::Driver { qid, .. }
            | Self::EmptyMapping { qid, .. }
            | Self::VerificationFailed { qid, .. }
            | Self::NumericLeak { qid, .. } => qid,
        }
    }

    /// Surface is unusable
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Driver { source, .. } if source.is_infrastructure())
    }

    /// Control is obscured or loading
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Driver { source, .. } if source.is_blocking())
    }

    /// Worth a second attempt within the same field
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Driver { source, .. } => source.is_retryable(),
            Self::VerificationFailed { .. } | Self::NumericLeak { .. } => true,
            Self::NotFound { .. } | Self::EmptyMapping { .. } => false,
        }
    }
}

/// Attach a field key to driver results
pub trait DriverResultExt<T> {
    /// Map a driver error into [`FieldError::Driver`]
    ///
    /// # Errors
    /// Returns the wrapped error if `self` is an error
    fn for_field(self, qid: &str) -> Result<T, FieldError>;
}

impl<T> DriverResultExt<T> for Result<T, DriverError> {
    fn for_field(self, qid: &str) -> Result<T, FieldError> {
        self.map_err(|e| FieldError::driver(qid, e))
    }
}

/// Failure that ends a run
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// File could not be read
    #[error("IO error at {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Surface failed outside any field boundary
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Too many consecutive infrastructure failures
    #[error("run aborted after {failures} consecutive infrastructure failures: {last}")]
    InfrastructureAbort {
        /// Failures counted
        failures: u32,
        /// Last failure seen
        last: FieldError,
    },

    /// Save collaborator failed
    #[error("save failed: {0}")]
    Save(String),
}

impl EngineError {
    /// Create IO error with path context
    #[must_use]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Caused by the surface becoming unusable
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Driver(e) => e.is_infrastructure(),
            Self::InfrastructureAbort { .. } => true,
            Self::Config(_) | Self::Io { .. } | Self::Save(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_classification() {
        let infra = FieldError::driver("title", DriverError::Disconnected("gone".into()));
        assert!(infra.is_infrastructure());
        assert!(!infra.is_blocking());

        let blocked = FieldError::driver("title", DriverError::Obscured("overlay".into()));
        assert!(blocked.is_blocking());
        assert!(blocked.is_retryable());

        let empty = FieldError::EmptyMapping {
            qid: "tags".into(),
            attempts: 8,
        };
        assert_eq!(empty.qid(), "tags");
        assert!(empty.to_string().contains("empty mapping"));
    }

    #[test]
    fn driver_result_ext() {
        let r: Result<(), DriverError> = Err(DriverError::StaleHandle(4));
        let err = r.for_field("code").unwrap_err();
        assert_eq!(err.qid(), "code");
    }
}
