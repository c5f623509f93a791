//! A single Postgres session implementing the importer's store traits.

use async_trait::async_trait;
use sqlx::PgConnection;

use rowseed_core::record::{FieldValue, ImportRecord, TargetTable};
use rowseed_core::store::{ImportSession, SchemaInspector};
use rowseed_core::types::RowCount;
use rowseed_core::StoreError;

use crate::error::{describe, is_unique_violation, query_error, write_error};
use crate::sql;

/// One open connection, exclusively owned by a run.
pub struct PgSession {
    conn: PgConnection,
}

impl PgSession {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub fn into_inner(self) -> PgConnection {
        self.conn
    }

    /// Whether a row with `key` is present. Used to confirm that a raised
    /// unique violation was about the natural key and not another constraint.
    async fn key_exists(&mut self, table: &TargetTable, key: &str) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(&sql::key_exists_sql(table))
            .bind(key)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| query_error(&e))?;
        Ok(exists)
    }
}

#[async_trait]
impl SchemaInspector for PgSession {
    async fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(sql::table_exists_sql())
            .bind(table)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| query_error(&e))?;
        Ok(exists)
    }

    async fn key_is_unique(&mut self, table: &str, column: &str) -> Result<bool, StoreError> {
        let (unique,): (bool,) = sqlx::query_as(sql::key_is_unique_sql())
            .bind(table)
            .bind(column)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| query_error(&e))?;
        Ok(unique)
    }
}

#[async_trait]
impl ImportSession for PgSession {
    async fn ping(&mut self) -> Result<(), StoreError> {
        crate::health_check(&mut self.conn)
            .await
            .map_err(|e| query_error(&e))
    }

    async fn count_rows(&mut self, table: &TargetTable) -> Result<RowCount, StoreError> {
        let (count,): (i64,) = sqlx::query_as(&sql::count_rows_sql(table))
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| query_error(&e))?;
        Ok(count)
    }

    async fn insert_if_absent(
        &mut self,
        table: &TargetTable,
        record: &ImportRecord,
    ) -> Result<u64, StoreError> {
        let stmt = sql::insert_if_absent_sql(table, record);

        let mut query = sqlx::query(&stmt.sql).bind(record.natural_key.as_str());
        for value in &stmt.params {
            query = match value {
                FieldValue::Bool(v) => query.bind(*v),
                FieldValue::Int(v) => query.bind(*v),
                FieldValue::Float(v) => query.bind(*v),
                FieldValue::Text(v) => query.bind(v.as_str()),
                FieldValue::Timestamp(v) => query.bind(*v),
                // Inlined as a literal by the statement builder.
                FieldValue::Null => query,
            };
        }
        if let Some(created_at) = stmt.created_at {
            query = query.bind(*created_at);
        }

        match query.execute(&mut self.conn).await {
            Ok(result) => Ok(result.rows_affected()),
            Err(e) if is_unique_violation(&e) => {
                if self.key_exists(table, &record.natural_key).await? {
                    Err(StoreError::DuplicateKey {
                        key: record.natural_key.clone(),
                    })
                } else {
                    Err(StoreError::Write(describe(&e)))
                }
            }
            Err(e) => Err(write_error(&e)),
        }
    }
}
