//! Skip registry
//!
//! Run-scoped record of which top-level fields were skipped and why.
//! The first recorded reason for a qid wins; later inserts are ignored.

use indexmap::IndexMap;

/// Ordered map `top-level qid -> reason`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipRegistry {
    reasons: IndexMap<String, String>,
}

impl SkipRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skip reason
    ///
    /// Returns `true` if this was the first reason for `qid`. The diagnostic
    /// line `SKIP_FIELD <qid>: <reason>` is emitted only on first insert.
    pub fn record(&mut self, qid: impl Into<String>, reason: impl ToString) -> bool {
        let qid = qid.into();
        if self.reasons.contains_key(&qid) {
            return false;
        }
        let reason = reason.to_string();
        tracing::info!(qid = %qid, reason = %reason, "SKIP_FIELD {qid}: {reason}");
        self.reasons.insert(qid, reason);
        true
    }

    /// Recorded reason for a qid
    #[inline]
    #[must_use]
    pub fn reason(&self, qid: &str) -> Option<&str> {
        self.reasons.get(qid).map(String::as_str)
    }

    /// Check if a qid was skipped
    #[inline]
    #[must_use]
    pub fn contains(&self, qid: &str) -> bool {
        self.reasons.contains_key(qid)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.reasons.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of skipped qids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    /// Check if nothing was skipped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Drop all entries
    #[inline]
    pub fn clear(&mut self) {
        self.reasons.clear();
    }
}

impl FromIterator<(String, String)> for SkipRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (qid, reason) in iter {
            registry.record(qid, reason);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reason_wins() {
        let mut r = SkipRegistry::new();
        assert!(r.record("sisId", "protected"));
        assert!(!r.record("sisId", "blocked"));
        assert_eq!(r.reason("sisId"), Some("protected"));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn preserves_insertion_order() {
        let r: SkipRegistry = vec![
            ("b".to_string(), "x".to_string()),
            ("a".to_string(), "y".to_string()),
        ]
        .into_iter()
        .collect();
        let keys: Vec<_> = r.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn clear_resets() {
        let mut r = SkipRegistry::new();
        r.record("x", "y");
        r.clear();
        assert!(r.is_empty());
        assert!(r.record("x", "z"));
    }
}
