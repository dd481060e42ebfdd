//! Difference classifier
//!
//! Pure comparison of two snapshots plus the run's registries. Every field
//! key present in either snapshot becomes at most one row, in snapshot
//! encounter order. Priority per key: hidden rows are omitted, then
//! disabled, then skipped, then equal values are unable and the rest
//! updated.

use crate::snapshot::{FieldSnapshot, SnapshotEntry};
use formprobe_policy::SkipRegistry;
use formprobe_schema::FieldValue;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comment on an unable row without a recorded cause
pub const UNCHANGED_COMMENT: &str = "value unchanged";

/// Comment on a disabled row
pub const DISABLED_COMMENT: &str = "field is disabled";

/// Fate of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffStatus {
    /// Value changed
    Updated,
    /// Deliberately not touched
    Skipped,
    /// Present but not interactive
    Disabled,
    /// Touched but unchanged
    Unable,
}

impl DiffStatus {
    /// Status name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "Updated",
            Self::Skipped => "Skipped",
            Self::Disabled => "Disabled",
            Self::Unable => "Unable",
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    /// Field key
    pub qid: String,
    /// Human label
    pub label: String,
    /// JSON-encoded value before the run
    pub before: String,
    /// JSON-encoded value after the run
    pub after: String,
    /// Classification
    pub status: DiffStatus,
    /// Explanation, empty for updated rows
    pub comment: String,
}

/// Everything the classifier looks at
#[derive(Debug, Clone, Copy)]
pub struct DiffInputs<'a> {
    /// Snapshot taken before filling
    pub before: &'a FieldSnapshot,
    /// Snapshot taken after saving
    pub after: &'a FieldSnapshot,
    /// Skipped top-level qids
    pub skips: &'a SkipRegistry,
    /// Disabled field keys
    pub disabled: &'a IndexSet<String>,
    /// Recorded causes for fields that could not be updated
    pub unable: Option<&'a IndexMap<String, String>>,
    /// Restrict output to these keys; disabled and skipped rows bypass it
    pub allow_list: Option<&'a [String]>,
}

impl<'a> DiffInputs<'a> {
    /// Inputs with no unable log and no allow-list
    #[must_use]
    pub fn new(
        before: &'a FieldSnapshot,
        after: &'a FieldSnapshot,
        skips: &'a SkipRegistry,
        disabled: &'a IndexSet<String>,
    ) -> Self {
        Self {
            before,
            after,
            skips,
            disabled,
            unable: None,
            allow_list: None,
        }
    }

    /// With the run's unable-reason log
    #[must_use]
    pub fn with_unable(mut self, unable: &'a IndexMap<String, String>) -> Self {
        self.unable = Some(unable);
        self
    }

    /// With an allow-list
    #[must_use]
    pub fn with_allow_list(mut self, allow_list: &'a [String]) -> Self {
        self.allow_list = Some(allow_list);
        self
    }
}

/// Classify every field key into a row
#[must_use]
pub fn classify(inputs: &DiffInputs<'_>) -> Vec<DiffRow> {
    let mut keys: IndexMap<&str, &SnapshotEntry> = IndexMap::new();
    for (key, entry) in inputs.before.entries().chain(inputs.after.entries()) {
        keys.entry(key).or_insert(entry);
    }

    keys.into_iter()
        .filter_map(|(key, entry)| classify_key(inputs, key, entry))
        .collect()
}

fn classify_key(inputs: &DiffInputs<'_>, key: &str, entry: &SnapshotEntry) -> Option<DiffRow> {
    let top = entry.top_qid.as_str();
    let hidden = |snap: &FieldSnapshot| snap.is_hidden(key) || snap.is_hidden(top);
    if hidden(inputs.before) || hidden(inputs.after) {
        return None;
    }

    let before = inputs.before.get(key).unwrap_or(&FieldValue::NoValue);
    let after = inputs.after.get(key).unwrap_or(&FieldValue::NoValue);
    let row = |status: DiffStatus, comment: String| DiffRow {
        qid: key.to_string(),
        label: entry.label.clone(),
        before: before.to_json_string(),
        after: after.to_json_string(),
        status,
        comment,
    };

    if inputs.disabled.contains(key) || inputs.disabled.contains(top) {
        return Some(row(DiffStatus::Disabled, DISABLED_COMMENT.to_string()));
    }
    if let Some(reason) = inputs.skips.reason(top) {
        return Some(row(DiffStatus::Skipped, dedup_reason(reason)));
    }
    if let Some(allow) = inputs.allow_list {
        if !allow.iter().any(|a| a == key || a == top) {
            return None;
        }
    }

    if before.normalized_eq(after) {
        let comment = inputs
            .unable
            .and_then(|log| log.get(key).or_else(|| log.get(top)))
            .map_or_else(|| UNCHANGED_COMMENT.to_string(), Clone::clone);
        Some(row(DiffStatus::Unable, comment))
    } else {
        Some(row(DiffStatus::Updated, String::new()))
    }
}

/// Collapse repeated `; `-separated reason parts
#[must_use]
pub fn dedup_reason(reason: &str) -> String {
    let parts: IndexSet<&str> = reason
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    parts.into_iter().collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(values: &[(&str, FieldValue)]) -> FieldSnapshot {
        let mut s = FieldSnapshot::new();
        for (k, v) in values {
            let top = k.split('.').next().unwrap_or(*k);
            s.insert(*k, top, k.to_uppercase(), v.clone());
        }
        s
    }

    fn statuses(rows: &[DiffRow]) -> Vec<(&str, DiffStatus)> {
        rows.iter().map(|r| (r.qid.as_str(), r.status)).collect()
    }

    #[test]
    fn priority_order() {
        let before = snap(&[
            ("title", FieldValue::text("A")),
            ("status", FieldValue::text("Active")),
            ("sisId", FieldValue::text("S1")),
            ("code", FieldValue::text("C")),
        ]);
        let after = snap(&[
            ("title", FieldValue::text("A-CDtest")),
            ("status", FieldValue::text("Active")),
            ("sisId", FieldValue::text("S1")),
            ("code", FieldValue::text(" C ")),
        ]);
        let mut skips = SkipRegistry::new();
        skips.record("sisId", "protected");
        let disabled: IndexSet<String> = ["status".to_string()].into_iter().collect();

        let rows = classify(&DiffInputs::new(&before, &after, &skips, &disabled));
        assert_eq!(
            statuses(&rows),
            vec![
                ("title", DiffStatus::Updated),
                ("status", DiffStatus::Disabled),
                ("sisId", DiffStatus::Skipped),
                ("code", DiffStatus::Unable),
            ]
        );
        assert_eq!(rows[0].before, "\"A\"");
        assert_eq!(rows[0].after, "\"A-CDtest\"");
        assert_eq!(rows[3].comment, UNCHANGED_COMMENT);
    }

    #[test]
    fn hidden_in_either_snapshot_is_omitted() {
        let mut before = snap(&[("a", FieldValue::text("1")), ("b", FieldValue::text("1"))]);
        let mut after = snap(&[("a", FieldValue::text("2")), ("b", FieldValue::text("2"))]);
        before.mark_hidden("a");
        after.mark_hidden("b");
        let rows = classify(&DiffInputs::new(
            &before,
            &after,
            &SkipRegistry::new(),
            &IndexSet::new(),
        ));
        assert!(rows.is_empty());
    }

    #[test]
    fn leaf_inherits_top_level_skip() {
        let before = snap(&[("creditHours.min", FieldValue::Number(1.0))]);
        let after = snap(&[("creditHours.min", FieldValue::Number(2.0))]);
        let mut skips = SkipRegistry::new();
        skips.record("creditHours", "control blocked; control blocked");
        let rows = classify(&DiffInputs::new(&before, &after, &skips, &IndexSet::new()));
        assert_eq!(rows[0].status, DiffStatus::Skipped);
        assert_eq!(rows[0].comment, "control blocked");
    }

    #[test]
    fn allow_list_keeps_disabled_and_skipped() {
        let before = snap(&[
            ("a", FieldValue::text("1")),
            ("b", FieldValue::text("1")),
            ("c", FieldValue::text("1")),
            ("d", FieldValue::text("1")),
        ]);
        let after = snap(&[
            ("a", FieldValue::text("2")),
            ("b", FieldValue::text("2")),
            ("c", FieldValue::text("1")),
            ("d", FieldValue::text("2")),
        ]);
        let mut skips = SkipRegistry::new();
        skips.record("c", "protected");
        let disabled: IndexSet<String> = ["b".to_string()].into_iter().collect();
        let allow = vec!["a".to_string()];

        let rows = classify(
            &DiffInputs::new(&before, &after, &skips, &disabled).with_allow_list(&allow),
        );
        assert_eq!(
            statuses(&rows),
            vec![
                ("a", DiffStatus::Updated),
                ("b", DiffStatus::Disabled),
                ("c", DiffStatus::Skipped),
            ]
        );
    }

    #[test]
    fn unable_comment_uses_recorded_cause() {
        let before = snap(&[("tags", FieldValue::List(vec![]))]);
        let after = snap(&[("tags", FieldValue::List(vec![]))]);
        let mut unable = IndexMap::new();
        unable.insert("tags".to_string(), "empty mapping".to_string());
        let skips = SkipRegistry::new();
        let disabled = IndexSet::new();
        let rows = classify(&DiffInputs::new(&before, &after, &skips, &disabled).with_unable(&unable));
        assert_eq!(rows[0].status, DiffStatus::Unable);
        assert_eq!(rows[0].comment, "empty mapping");
    }

    #[test]
    fn new_keys_in_after_follow_before_order() {
        let before = snap(&[("a", FieldValue::text("1"))]);
        let after = snap(&[("z", FieldValue::text("1")), ("a", FieldValue::text("2"))]);
        let rows = classify(&DiffInputs::new(
            &before,
            &after,
            &SkipRegistry::new(),
            &IndexSet::new(),
        ));
        assert_eq!(
            statuses(&rows),
            vec![("a", DiffStatus::Updated), ("z", DiffStatus::Updated)]
        );
        assert_eq!(rows[1].before, "\"no-value\"");
    }
}
