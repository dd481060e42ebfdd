//! Stable diagnostic lines
//!
//! These lines are parsed by log-correlation tooling; their text is fixed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One diagnostic emitted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Field skipped by policy or because it stayed blocked
    SkipField {
        /// Top-level qid
        qid: String,
        /// Recorded reason
        reason: String,
    },
    /// No locator matched the field
    FieldNotFound {
        /// Field key
        qid: String,
        /// Human label
        label: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipField { qid, reason } => write!(f, "SKIP_FIELD {qid}: {reason}"),
            Self::FieldNotFound { qid, label } => {
                write!(f, "Could not find field: {qid} ({label})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_formats() {
        let skip = Diagnostic::SkipField {
            qid: "sisId".into(),
            reason: "protected".into(),
        };
        assert_eq!(skip.to_string(), "SKIP_FIELD sisId: protected");

        let missing = Diagnostic::FieldNotFound {
            qid: "creditHours.min".into(),
            label: "Min".into(),
        };
        assert_eq!(missing.to_string(), "Could not find field: creditHours.min (Min)");
    }
}
