//! Run-scoped state
//!
//! A [`RunContext`] is created at the start of a run, threaded through every
//! field, and consumed by [`RunContext::finish`] at the end. Nothing here
//! outlives a run.

use crate::diagnostics::Diagnostic;
use formprobe_policy::{ActionContext, SkipRegistry};
use indexmap::{IndexMap, IndexSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable state of one run
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    action: ActionContext,
    processed: IndexSet<String>,
    skips: SkipRegistry,
    disabled: IndexSet<String>,
    unable: IndexMap<String, String>,
    diagnostics: Vec<Diagnostic>,
    rng: StdRng,
    consecutive_infra_failures: u32,
}

impl RunContext {
    /// Create a context; a seed makes option choice reproducible
    #[must_use]
    pub fn new(action: ActionContext, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            run_id: RunId::new(),
            action,
            processed: IndexSet::new(),
            skips: SkipRegistry::new(),
            disabled: IndexSet::new(),
            unable: IndexMap::new(),
            diagnostics: Vec::new(),
            rng,
            consecutive_infra_failures: 0,
        }
    }

    /// Run identifier
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Action being exercised
    #[inline]
    #[must_use]
    pub fn action(&self) -> &ActionContext {
        &self.action
    }

    /// Mark a field key processed; `false` if it already was
    pub fn mark_processed(&mut self, key: impl Into<String>) -> bool {
        self.processed.insert(key.into())
    }

    /// Check if a field key was processed
    #[inline]
    #[must_use]
    pub fn is_processed(&self, key: &str) -> bool {
        self.processed.contains(key)
    }

    /// Record a skip reason for a top-level qid
    ///
    /// Only the first reason is kept and logged.
    pub fn record_skip(&mut self, qid: &str, reason: impl ToString) -> bool {
        let reason = reason.to_string();
        let first = self.skips.record(qid, &reason);
        if first {
            self.diagnostics.push(Diagnostic::SkipField {
                qid: qid.to_string(),
                reason,
            });
        }
        first
    }

    /// Skip registry
    #[inline]
    #[must_use]
    pub fn skips(&self) -> &SkipRegistry {
        &self.skips
    }

    /// Record a present but non-interactive field
    pub fn record_disabled(&mut self, key: impl Into<String>) {
        let key = key.into();
        tracing::debug!(key = %key, "field disabled");
        self.disabled.insert(key);
    }

    /// Disabled field keys
    #[inline]
    #[must_use]
    pub fn disabled(&self) -> &IndexSet<String> {
        &self.disabled
    }

    /// Record why a field could not be updated; first reason wins
    pub fn record_unable(&mut self, key: impl Into<String>, reason: impl ToString) {
        let key = key.into();
        if !self.unable.contains_key(&key) {
            let reason = reason.to_string();
            tracing::warn!(key = %key, reason = %reason, "unable to update field");
            self.unable.insert(key, reason);
        }
    }

    /// Record a field no locator matched
    pub fn record_not_found(&mut self, key: &str, label: &str) {
        let diagnostic = Diagnostic::FieldNotFound {
            qid: key.to_string(),
            label: label.to_string(),
        };
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
        self.record_unable(key, "could not find field");
    }

    /// Recorded unable reasons
    #[inline]
    #[must_use]
    pub fn unable_reasons(&self) -> &IndexMap<String, String> {
        &self.unable
    }

    /// Diagnostics so far
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Run RNG
    #[inline]
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Count an infrastructure failure; returns the consecutive count
    pub fn note_infra_failure(&mut self) -> u32 {
        self.consecutive_infra_failures += 1;
        self.consecutive_infra_failures
    }

    /// Reset the consecutive infrastructure failure count
    #[inline]
    pub fn note_field_completed(&mut self) {
        self.consecutive_infra_failures = 0;
    }

    /// Tear down the context, keeping what the report needs
    #[must_use]
    pub fn finish(self) -> RunOutcome {
        RunOutcome {
            run_id: self.run_id,
            action: self.action,
            skips: self.skips,
            disabled: self.disabled,
            unable: self.unable,
            diagnostics: self.diagnostics,
        }
    }
}

/// What remains of a [`RunContext`] after the run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Run identifier
    pub run_id: RunId,
    /// Action exercised
    pub action: ActionContext,
    /// Skipped top-level qids
    pub skips: SkipRegistry,
    /// Disabled field keys
    pub disabled: IndexSet<String>,
    /// Unable reasons by field key
    pub unable: IndexMap<String, String>,
    /// Diagnostics in emission order
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use formprobe_policy::ActionKind;

    fn ctx() -> RunContext {
        RunContext::new(ActionContext::for_kind(ActionKind::Update), Some(1))
    }

    #[test]
    fn processed_set_is_idempotent() {
        let mut c = ctx();
        assert!(c.mark_processed("creditHours.min"));
        assert!(!c.mark_processed("creditHours.min"));
        assert!(c.is_processed("creditHours.min"));
    }

    #[test]
    fn skip_diagnostic_emitted_once() {
        let mut c = ctx();
        assert!(c.record_skip("sisId", "protected"));
        assert!(!c.record_skip("sisId", "again"));
        assert_eq!(c.diagnostics().len(), 1);
        assert_eq!(c.diagnostics()[0].to_string(), "SKIP_FIELD sisId: protected");
    }

    #[test]
    fn not_found_records_reason_and_line() {
        let mut c = ctx();
        c.record_not_found("code", "Code");
        assert_eq!(c.unable_reasons().get("code").map(String::as_str), Some("could not find field"));
        assert_eq!(c.diagnostics()[0].to_string(), "Could not find field: code (Code)");
    }

    #[test]
    fn infra_counter_resets() {
        let mut c = ctx();
        assert_eq!(c.note_infra_failure(), 1);
        assert_eq!(c.note_infra_failure(), 2);
        c.note_field_completed();
        assert_eq!(c.note_infra_failure(), 1);
    }

    #[test]
    fn finish_keeps_registries() {
        let mut c = ctx();
        c.record_disabled("status");
        c.record_unable("title", "unchanged");
        let outcome = c.finish();
        assert!(outcome.disabled.contains("status"));
        assert_eq!(outcome.unable.len(), 1);
    }
}
