//! Error taxonomy for the loader.
//!
//! [`StoreError`] is what a single store call can fail with. The importer
//! absorbs `DuplicateKey` and `Write` per record; everything else surfaces
//! as a fatal [`RunError`].

use crate::outcome::RunSummary;

/// Failure of a single call against the backing store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The session could not be opened or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The natural key is already present in the target table.
    #[error("Duplicate key: {key}")]
    DuplicateKey { key: String },

    /// Any other failure writing one record (constraint, malformed data, ...).
    #[error("Write failed: {0}")]
    Write(String),

    /// A read-only query (inspection, row count) failed.
    #[error("Query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Why the target table cannot be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionProblem {
    #[error("does not exist")]
    MissingTable,

    /// `ON CONFLICT (<key>)` needs a single-column unique index or constraint.
    #[error("has no unique constraint on key column \"{column}\"")]
    KeyNotUnique { column: String },
}

/// Fatal run failure. Only these terminate a run early.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    /// The record source is malformed; nothing was opened or written.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The target table is missing or cannot be written idempotently.
    #[error("Precondition failed: table \"{table}\" {problem}")]
    Precondition {
        table: String,
        problem: PreconditionProblem,
    },

    /// The session could not be acquired or was lost mid-run.
    ///
    /// `partial` is informational only: `post_count` was never sampled.
    #[error("Connection error: {reason}")]
    Connection {
        reason: String,
        partial: Option<RunSummary>,
    },

    /// A read-only bookkeeping query failed for a reason other than connectivity.
    #[error("Query failed: {reason}")]
    Query {
        reason: String,
        partial: Option<RunSummary>,
    },

    /// The run was cancelled between records.
    #[error("Run interrupted after {} of {} records", .partial.processed(), .total)]
    Interrupted { partial: RunSummary, total: usize },
}

impl RunError {
    /// The partial summary accumulated before the failure, if any.
    pub fn partial(&self) -> Option<&RunSummary> {
        match self {
            Self::Connection { partial, .. } | Self::Query { partial, .. } => partial.as_ref(),
            Self::Interrupted { partial, .. } => Some(partial),
            Self::Validation(_) | Self::Precondition { .. } => None,
        }
    }

    /// Wrap a store error raised outside the per-record loop.
    pub(crate) fn from_store(err: StoreError, partial: Option<RunSummary>) -> Self {
        match err {
            StoreError::Connection(reason) => Self::Connection { reason, partial },
            StoreError::Query(reason) => Self::Query { reason, partial },
            other => Self::Query {
                reason: other.to_string(),
                partial,
            },
        }
    }
}
