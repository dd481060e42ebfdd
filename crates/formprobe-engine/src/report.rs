//! Diff report

use crate::context::RunId;
use crate::diff::{DiffRow, DiffStatus};
use chrono::{DateTime, Utc};
use formprobe_policy::ActionKind;
use serde::{Deserialize, Serialize};

/// Row counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Updated rows
    pub updated: usize,
    /// Skipped rows
    pub skipped: usize,
    /// Disabled rows
    pub disabled: usize,
    /// Unable rows
    pub unable: usize,
}

impl StatusCounts {
    /// Tally rows
    #[must_use]
    pub fn tally(rows: &[DiffRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            match row.status {
                DiffStatus::Updated => counts.updated += 1,
                DiffStatus::Skipped => counts.skipped += 1,
                DiffStatus::Disabled => counts.disabled += 1,
                DiffStatus::Unable => counts.unable += 1,
            }
        }
        counts
    }

    /// Total rows
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.disabled + self.unable
    }
}

/// Ordered rows for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    /// Run identifier
    pub run_id: RunId,
    /// Entity the template describes
    pub entity: String,
    /// Action exercised
    pub action: ActionKind,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Rows in snapshot order
    pub rows: Vec<DiffRow>,
    /// Counts per status
    pub counts: StatusCounts,
}

impl DiffReport {
    /// Build a report from classified rows
    #[must_use]
    pub fn new(run_id: RunId, entity: impl Into<String>, action: ActionKind, rows: Vec<DiffRow>) -> Self {
        let counts = StatusCounts::tally(&rows);
        Self {
            run_id,
            entity: entity.into(),
            action,
            generated_at: Utc::now(),
            rows,
            counts,
        }
    }

    /// Row for a field key
    #[must_use]
    pub fn row(&self, qid: &str) -> Option<&DiffRow> {
        self.rows.iter().find(|r| r.qid == qid)
    }

    /// Rows with a given status
    pub fn rows_with_status(&self, status: DiffStatus) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(move |r| r.status == status)
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    /// Serialisation failure
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
