//! Driver errors

use thiserror::Error;

/// Failure talking to the UI surface
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// Surface is gone (closed page, dropped session)
    #[error("driver disconnected: {0}")]
    Disconnected(String),

    /// Interaction did not complete in time
    #[error("{op} timed out after {ms}ms")]
    Timeout {
        /// Operation name
        op: String,
        /// Budget in milliseconds
        ms: u64,
    },

    /// Another element intercepts pointer events
    #[error("control obscured: {0}")]
    Obscured(String),

    /// Element rejects the interaction
    #[error("control not interactable: {0}")]
    NotInteractable(String),

    /// Handle no longer refers to an attached element
    #[error("stale element handle {0}")]
    StaleHandle(u64),

    /// Malformed response from the surface
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Create a timeout error
    #[must_use]
    pub fn timeout(op: impl Into<String>, ms: u64) -> Self {
        Self::Timeout { op: op.into(), ms }
    }

    /// Surface itself is unusable; counts towards aborting the run
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Disconnected(_) | Self::Protocol(_))
    }

    /// Control is obscured or loading; worth one settle-and-retry
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Obscured(_))
    }

    /// Transient failure
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Obscured(_) | Self::StaleHandle(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(DriverError::Disconnected("closed".into()).is_infrastructure());
        assert!(!DriverError::timeout("click", 500).is_infrastructure());
        assert!(DriverError::Obscured("overlay".into()).is_blocking());
        assert!(DriverError::StaleHandle(3).is_retryable());
        assert!(!DriverError::NotInteractable("readonly".into()).is_retryable());
    }

    #[test]
    fn display() {
        assert_eq!(
            DriverError::timeout("query", 250).to_string(),
            "query timed out after 250ms"
        );
    }
}
