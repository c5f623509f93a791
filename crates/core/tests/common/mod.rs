//! In-memory store for driving the importer without a database.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use rowseed_core::record::{FieldValue, ImportRecord, TargetTable};
use rowseed_core::store::{ConnectionProvider, ImportSession, SchemaInspector};
use rowseed_core::types::RowCount;
use rowseed_core::StoreError;

/// Knobs for simulating store behaviour.
#[derive(Default)]
pub struct FakeBehaviour {
    /// Tables reported as existing.
    pub tables: HashSet<String>,
    /// Fail `acquire` with a connection error.
    pub unreachable: bool,
    /// Raise `DuplicateKey` on conflict instead of affecting zero rows.
    pub raise_on_conflict: bool,
    /// Keys whose insert fails with a write error.
    pub failing_keys: HashSet<String>,
    /// Key whose insert loses the connection.
    pub disconnect_on: Option<String>,
    /// Cancel this token after the given number of insert attempts.
    pub cancel_after: Option<(usize, CancellationToken)>,
    /// Rows added by a simulated concurrent writer on every insert attempt.
    pub concurrent_rows_per_insert: RowCount,
    /// Report the key column as lacking a unique constraint.
    pub key_not_unique: bool,
    /// Fail `ping` with this error.
    pub fail_ping: Option<StoreError>,
    /// Fail the table lookup with this error.
    pub fail_table_exists: Option<StoreError>,
    /// Fail the nth `count_rows` call (1-based) with this error.
    pub fail_count_on: Option<(usize, StoreError)>,
}

/// Observable state shared between a provider and its sessions.
#[derive(Default)]
pub struct FakeState {
    pub rows: BTreeMap<String, Vec<(String, FieldValue)>>,
    pub foreign_rows: RowCount,
    pub attempts: Vec<String>,
    pub counts: usize,
    pub acquired: usize,
    pub released: usize,
}

#[derive(Clone)]
pub struct FakeProvider {
    pub behaviour: Arc<FakeBehaviour>,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour: Arc::new(behaviour),
            state: Arc::default(),
        }
    }

    /// A provider whose store has the `schools` table.
    pub fn with_schools() -> Self {
        Self::new(FakeBehaviour {
            tables: HashSet::from(["schools".to_string()]),
            ..FakeBehaviour::default()
        })
    }

    /// Same backing state, different behaviour.
    pub fn reconfigure(&self, behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour: Arc::new(behaviour),
            state: Arc::clone(&self.state),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().rows.keys().cloned().collect()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }
}

pub struct FakeSession {
    behaviour: Arc<FakeBehaviour>,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl ConnectionProvider for FakeProvider {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession, StoreError> {
        if self.behaviour.unreachable {
            return Err(StoreError::Connection("connection refused".into()));
        }
        self.state.lock().unwrap().acquired += 1;
        Ok(FakeSession {
            behaviour: Arc::clone(&self.behaviour),
            state: Arc::clone(&self.state),
        })
    }

    async fn release(&self, _session: FakeSession) {
        self.state.lock().unwrap().released += 1;
    }
}

#[async_trait]
impl SchemaInspector for FakeSession {
    async fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        if let Some(err) = &self.behaviour.fail_table_exists {
            return Err(err.clone());
        }
        Ok(self.behaviour.tables.contains(table))
    }

    async fn key_is_unique(&mut self, _table: &str, _column: &str) -> Result<bool, StoreError> {
        Ok(!self.behaviour.key_not_unique)
    }
}

#[async_trait]
impl ImportSession for FakeSession {
    async fn ping(&mut self) -> Result<(), StoreError> {
        match &self.behaviour.fail_ping {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn count_rows(&mut self, _table: &TargetTable) -> Result<RowCount, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.counts += 1;
        if let Some((nth, err)) = &self.behaviour.fail_count_on {
            if state.counts == *nth {
                return Err(err.clone());
            }
        }
        Ok(state.rows.len() as RowCount + state.foreign_rows)
    }

    async fn insert_if_absent(
        &mut self,
        _table: &TargetTable,
        record: &ImportRecord,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.attempts.push(record.natural_key.clone());
        state.foreign_rows += self.behaviour.concurrent_rows_per_insert;

        if let Some((after, token)) = &self.behaviour.cancel_after {
            if state.attempts.len() >= *after {
                token.cancel();
            }
        }

        if self.behaviour.disconnect_on.as_deref() == Some(record.natural_key.as_str()) {
            return Err(StoreError::Connection("server closed the connection".into()));
        }
        if self.behaviour.failing_keys.contains(&record.natural_key) {
            return Err(StoreError::Write(format!(
                "check constraint violated for {}",
                record.natural_key
            )));
        }

        if state.rows.contains_key(&record.natural_key) {
            if self.behaviour.raise_on_conflict {
                return Err(StoreError::DuplicateKey {
                    key: record.natural_key.clone(),
                });
            }
            return Ok(0);
        }

        state
            .rows
            .insert(record.natural_key.clone(), record.fields.clone());
        Ok(1)
    }
}

pub fn schools_table() -> TargetTable {
    TargetTable::new("schools", "code")
}

pub fn school(key: &str) -> ImportRecord {
    ImportRecord::new(key)
        .field("name", format!("School {key}"))
        .field("region", "North")
        .field("capacity", 250)
}

pub fn schools(keys: &[&str]) -> Vec<ImportRecord> {
    keys.iter().map(|k| school(k)).collect()
}
