//! Field paths for addressing composite leaves
//!
//! Provides [`FieldPath`] for hierarchical addressing of fields within a template.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Path to a field or nested subfield
///
/// A top-level qid is an opaque key and may itself contain dots, so the
/// top-level part is kept separate from the composite sub-keys.
///
/// # Examples
/// - `("creditHours", [])` → `creditHours`
/// - `("creditHours", ["min"])` → `creditHours.min`
/// - `("schedule", ["window", "start"])` → `schedule.window.start`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    top: String,
    subs: Vec<String>,
}

impl FieldPath {
    /// Create path to a top-level field
    #[inline]
    #[must_use]
    pub fn top_level(qid: impl Into<String>) -> Self {
        Self {
            top: qid.into(),
            subs: Vec::new(),
        }
    }

    /// Create path from a top-level qid and sub-keys
    #[inline]
    #[must_use]
    pub fn new(top: impl Into<String>, subs: Vec<String>) -> Self {
        Self {
            top: top.into(),
            subs,
        }
    }

    /// Top-level qid owning this path
    #[inline]
    #[must_use]
    pub fn top(&self) -> &str {
        &self.top
    }

    /// Composite sub-keys below the top-level qid
    #[inline]
    #[must_use]
    pub fn subs(&self) -> &[String] {
        &self.subs
    }

    /// Number of sub-keys (0 for a top-level field)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.subs.len()
    }

    /// Check if this path addresses a top-level field
    #[inline]
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.subs.is_empty()
    }

    /// Get parent path (if not top-level)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.subs.is_empty() {
            None
        } else {
            Some(Self {
                top: self.top.clone(),
                subs: self.subs[..self.subs.len() - 1].to_vec(),
            })
        }
    }

    /// Last key: the deepest sub-key, or the top-level qid
    #[inline]
    #[must_use]
    pub fn last_key(&self) -> &str {
        self.subs.last().map_or(self.top.as_str(), String::as_str)
    }

    /// Append a sub-key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.subs.push(key.into());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.top == other.top
            && self.subs.len() <= other.subs.len()
            && self.subs == other.subs[..self.subs.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.subs.len() < other.subs.len() && self.is_prefix_of(other)
    }

    /// Join sub-keys with a custom separator, prefixed by the top-level qid
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        let mut out = self.top.clone();
        for sub in &self.subs {
            out.push_str(separator);
            out.push_str(sub);
        }
        out
    }

    /// Dotted form of this path (`top.sub.sub2`)
    #[inline]
    #[must_use]
    pub fn dotted(&self) -> String {
        self.join(".")
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Validate a qid or sub-key
///
/// Keys must be non-empty and free of whitespace.
pub fn validate_key(key: &str) -> Result<(), PathError> {
    if key.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if key.chars().any(char::is_whitespace) {
        return Err(PathError::InvalidSegment(key.to_string()));
    }
    Ok(())
}

/// Path parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty qid or sub-key
    #[error("empty path segment")]
    EmptySegment,

    /// Sub-key contains characters a dot-path cannot carry
    #[error("invalid path segment: '{0}'")]
    InvalidSegment(String),
}
