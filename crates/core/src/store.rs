//! Seams between the importer and a concrete database.
//!
//! The importer only ever talks to these traits, so runs can be driven
//! against Postgres (`rowseed-db`) or an in-memory fake in tests.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{ImportRecord, TargetTable};
use crate::types::RowCount;

/// Opens and closes the single session a run works on.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Session: ImportSession + SchemaInspector + Send;

    /// Open a session. One attempt, no retries.
    ///
    /// Must fail with [`StoreError::Connection`] when the store is unreachable.
    async fn acquire(&self) -> Result<Self::Session, StoreError>;

    /// Close a session. Never fails; problems are logged by the implementation.
    async fn release(&self, session: Self::Session);
}

/// Read-only metadata queries.
#[async_trait]
pub trait SchemaInspector: Send {
    /// Whether `table` exists in the session's active database/schema.
    async fn table_exists(&mut self, table: &str) -> Result<bool, StoreError>;

    /// Whether `column` alone is covered by a unique index or constraint on
    /// `table`, so conflicts on it can be detected by the store.
    async fn key_is_unique(&mut self, table: &str, column: &str) -> Result<bool, StoreError>;
}

/// Data operations the importer needs from an open session.
#[async_trait]
pub trait ImportSession: Send {
    /// Cheap round-trip proving the session is usable.
    async fn ping(&mut self) -> Result<(), StoreError>;

    /// Current number of rows in the target table.
    async fn count_rows(&mut self, table: &TargetTable) -> Result<RowCount, StoreError>;

    /// Insert `record` unless a row with its natural key already exists.
    ///
    /// Returns the number of rows affected: `1` when inserted, `0` when the
    /// key was already present. Implementations may instead fail with
    /// [`StoreError::DuplicateKey`] on conflict; the importer treats both the
    /// same way.
    async fn insert_if_absent(
        &mut self,
        table: &TargetTable,
        record: &ImportRecord,
    ) -> Result<u64, StoreError>;
}
