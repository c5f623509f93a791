//! The idempotent importer and the run orchestration around it.
//!
//! [`execute`] is the entry point: validate the source, acquire a session,
//! check the target table exists and is unique on its key column, run the
//! [`Importer`], release the session.
//! The session is released on every path that acquired it.
//!
//! Per-record outcomes:
//!
//! | Store result                  | Outcome            | Run continues |
//! |-------------------------------|--------------------|---------------|
//! | rows affected > 0             | `Inserted`         | yes           |
//! | rows affected == 0            | `SkippedDuplicate` | yes           |
//! | `StoreError::DuplicateKey`    | `SkippedDuplicate` | yes           |
//! | `StoreError::Write` / `Query` | `Failed(reason)`   | yes           |
//! | `StoreError::Connection`      | --                 | no (fatal)    |

use tokio_util::sync::CancellationToken;

use crate::error::{PreconditionProblem, RunError, StoreError};
use crate::outcome::{ImportOutcome, ImportRun, RecordOutcome, RunSummary};
use crate::record::{ImportRecord, TargetTable};
use crate::store::{ConnectionProvider, ImportSession, SchemaInspector};
use crate::validation::validate_records;

/// Loads records into one table, one at a time, in source order.
pub struct Importer<'a> {
    table: &'a TargetTable,
    cancel: CancellationToken,
}

impl<'a> Importer<'a> {
    pub fn new(table: &'a TargetTable) -> Self {
        Self {
            table,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between records once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ensure every record exists in the table exactly once.
    ///
    /// The caller must already have checked that the table exists. A single
    /// record's failure never aborts the batch; only a lost connection, a
    /// failed row count, or cancellation end the run early, each carrying the
    /// partial summary.
    pub async fn run<S>(&self, session: &mut S, records: &[ImportRecord]) -> Result<ImportRun, RunError>
    where
        S: ImportSession + ?Sized,
    {
        let table = self.table;
        let total = records.len();

        let pre_count = session
            .count_rows(table)
            .await
            .map_err(|e| RunError::from_store(e, None))?;
        let mut summary = RunSummary::new(pre_count);
        let mut outcomes = Vec::with_capacity(total);

        tracing::info!(table = %table.name, records = total, pre_count, "Starting import");

        for record in records {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    table = %table.name,
                    processed = summary.processed(),
                    total,
                    "Import cancelled"
                );
                return Err(RunError::Interrupted {
                    partial: summary,
                    total,
                });
            }

            let outcome = match session.insert_if_absent(table, record).await {
                Ok(0) => ImportOutcome::SkippedDuplicate,
                Ok(_) => ImportOutcome::Inserted,
                Err(StoreError::DuplicateKey { .. }) => ImportOutcome::SkippedDuplicate,
                Err(StoreError::Connection(reason)) => {
                    tracing::error!(
                        key = %record.natural_key,
                        error = %reason,
                        "Connection lost during import"
                    );
                    return Err(RunError::Connection {
                        reason,
                        partial: Some(summary),
                    });
                }
                Err(StoreError::Write(reason) | StoreError::Query(reason)) => {
                    ImportOutcome::Failed(reason)
                }
            };

            match &outcome {
                ImportOutcome::Failed(reason) => {
                    tracing::warn!(key = %record.natural_key, error = %reason, "Record failed");
                }
                other => {
                    tracing::debug!(key = %record.natural_key, outcome = other.as_str(), "Record processed");
                }
            }

            summary.record(&outcome);
            outcomes.push(RecordOutcome {
                natural_key: record.natural_key.clone(),
                outcome,
            });
        }

        let post_count = match session.count_rows(table).await {
            Ok(count) => count,
            Err(e) => return Err(RunError::from_store(e, Some(summary))),
        };
        summary.post_count = Some(post_count);

        if summary.counts_consistent() == Some(false) {
            tracing::warn!(
                table = %table.name,
                expected = summary.expected_post_count(),
                actual = post_count,
                "Row count changed by more than the inserted records; concurrent writer?"
            );
        }

        tracing::info!(
            table = %table.name,
            inserted = summary.inserted,
            skipped = summary.skipped,
            failed = summary.failed,
            post_count,
            "Import finished"
        );

        Ok(ImportRun {
            table: table.name.clone(),
            summary,
            outcomes,
        })
    }
}

/// Run a complete import through `provider`.
///
/// Fails before acquiring a session if the source is invalid, and before
/// touching any record if the target table is missing.
pub async fn execute<P>(
    provider: &P,
    table: &TargetTable,
    records: &[ImportRecord],
    cancel: CancellationToken,
) -> Result<ImportRun, RunError>
where
    P: ConnectionProvider,
{
    validate_records(table, records)?;

    let mut session = provider
        .acquire()
        .await
        .map_err(|e| RunError::from_store(e, None))?;
    tracing::debug!(table = %table.name, "Session acquired");

    let result = run_on_session(&mut session, table, records, cancel).await;

    provider.release(session).await;
    tracing::debug!(table = %table.name, "Session released");

    result
}

async fn run_on_session<S>(
    session: &mut S,
    table: &TargetTable,
    records: &[ImportRecord],
    cancel: CancellationToken,
) -> Result<ImportRun, RunError>
where
    S: ImportSession + SchemaInspector,
{
    session
        .ping()
        .await
        .map_err(|e| RunError::from_store(e, None))?;

    let exists = session
        .table_exists(&table.name)
        .await
        .map_err(|e| RunError::from_store(e, None))?;
    if !exists {
        tracing::error!(table = %table.name, "Target table does not exist");
        return Err(RunError::Precondition {
            table: table.name.clone(),
            problem: PreconditionProblem::MissingTable,
        });
    }

    let unique = session
        .key_is_unique(&table.name, &table.key_column)
        .await
        .map_err(|e| RunError::from_store(e, None))?;
    if !unique {
        tracing::error!(
            table = %table.name,
            key_column = %table.key_column,
            "Key column has no unique constraint",
        );
        return Err(RunError::Precondition {
            table: table.name.clone(),
            problem: PreconditionProblem::KeyNotUnique {
                column: table.key_column.clone(),
            },
        });
    }

    Importer::new(table)
        .with_cancellation(cancel)
        .run(session, records)
        .await
}
