//! Per-record outcomes and the run summary.

use serde::Serialize;

use crate::types::RowCount;

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ImportOutcome {
    Inserted,
    SkippedDuplicate,
    Failed(String),
}

impl ImportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::SkippedDuplicate => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// An outcome tagged with the natural key it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub natural_key: String,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

/// Before/after accounting for one run.
///
/// Counters only ever grow during a run. `post_count` is `None` until the
/// final row count has been sampled; a summary without it is partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pre_count: RowCount,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub post_count: Option<RowCount>,
}

impl RunSummary {
    pub fn new(pre_count: RowCount) -> Self {
        Self {
            pre_count,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Inserted => self.inserted += 1,
            ImportOutcome::SkippedDuplicate => self.skipped += 1,
            ImportOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Number of records that reached a terminal outcome.
    pub fn processed(&self) -> usize {
        self.inserted + self.skipped + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.post_count.is_some()
    }

    /// Row count the table should have if nobody else wrote to it.
    pub fn expected_post_count(&self) -> RowCount {
        self.pre_count + self.inserted as RowCount
    }

    /// `Some(false)` when the sampled post count disagrees with
    /// `pre_count + inserted`, which points at a concurrent writer.
    pub fn counts_consistent(&self) -> Option<bool> {
        self.post_count
            .map(|post| post == self.expected_post_count())
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRun {
    pub table: String,
    pub summary: RunSummary,
    /// One entry per record, in source order.
    pub outcomes: Vec<RecordOutcome>,
}

impl ImportRun {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            ImportOutcome::Failed(reason) => Some((o.natural_key.as_str(), reason.as_str())),
            _ => None,
        })
    }
}
