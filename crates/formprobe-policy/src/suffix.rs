//! Canonical suffix handling
//!
//! Mutated text values carry a fixed marker so they are recognisable in the
//! saved entity and so repeated runs never stack markers.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Default marker appended to mutated text
pub const DEFAULT_SUFFIX: &str = "-CDtest";

/// Fixed marker appended to mutated text values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSuffix(String);

impl Default for CanonicalSuffix {
    fn default() -> Self {
        Self(DEFAULT_SUFFIX.to_string())
    }
}

impl CanonicalSuffix {
    /// Create a suffix marker
    #[inline]
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// Marker text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker length in characters
    #[inline]
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Remove every occurrence of the marker, wherever it sits
    ///
    /// Removal repeats until none is left, since cutting one marker can
    /// join two fragments into another.
    #[must_use]
    pub fn strip<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let trimmed = value.trim_end();
        if self.0.is_empty() || !trimmed.contains(self.0.as_str()) {
            return Cow::Borrowed(trimmed);
        }
        let mut rest = trimmed.to_string();
        while rest.contains(self.0.as_str()) {
            rest = rest.replace(self.0.as_str(), "");
        }
        Cow::Owned(rest.trim_end().to_string())
    }

    /// Strip any prior marker and append exactly one
    #[must_use]
    pub fn apply(&self, value: &str) -> String {
        format!("{}{}", self.strip(value), self.0)
    }

    /// Like [`apply`](Self::apply), truncating the base so the result fits
    /// in `max_chars` while keeping the marker intact
    ///
    /// If the marker alone does not fit, the marker itself is truncated.
    #[must_use]
    pub fn apply_clamped(&self, value: &str, max_chars: Option<usize>) -> String {
        let base = self.strip(value);
        let Some(max) = max_chars else {
            return format!("{base}{}", self.0);
        };

        let suffix_len = self.char_len();
        if suffix_len >= max {
            return self.0.chars().take(max).collect();
        }

        let room = max - suffix_len;
        let truncated: String = base.chars().take(room).collect();
        format!("{}{}", truncated.trim_end(), self.0)
    }

    /// Count occurrences of the marker in a value
    #[must_use]
    pub fn occurrences(&self, value: &str) -> usize {
        if self.0.is_empty() {
            0
        } else {
            value.matches(self.0.as_str()).count()
        }
    }
}
