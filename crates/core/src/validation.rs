//! Pre-run checks on the record source.
//!
//! Runs before any session is acquired. Every problem found is collected so
//! a caller can fix the input in one pass.

use std::collections::HashSet;

use crate::error::RunError;
use crate::record::{is_valid_identifier, ImportRecord, TargetTable};

/// Check the table definition and every record against it.
///
/// Rejects empty natural keys, natural keys repeated within the source,
/// invalid or reserved column names, and columns repeated within a record.
pub fn validate_records(table: &TargetTable, records: &[ImportRecord]) -> Result<(), RunError> {
    let mut problems = table.identifier_errors();
    let mut seen_keys: HashSet<&str> = HashSet::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let position = index + 1;

        if record.natural_key.trim().is_empty() {
            problems.push(format!("record #{position}: natural key is empty"));
        } else if !seen_keys.insert(record.natural_key.as_str()) {
            problems.push(format!(
                "record #{position}: natural key {:?} appears more than once",
                record.natural_key
            ));
        }

        let mut seen_columns: HashSet<&str> = HashSet::with_capacity(record.fields.len());
        for (column, _) in &record.fields {
            if !is_valid_identifier(column) {
                problems.push(format!(
                    "record #{position}: invalid column identifier {column:?}"
                ));
            } else if *column == table.key_column {
                problems.push(format!(
                    "record #{position}: column {column:?} is the key column; set the natural key instead"
                ));
            } else if *column == table.created_at_column {
                problems.push(format!(
                    "record #{position}: column {column:?} is the created-at column; use the created_at override instead"
                ));
            } else if !seen_columns.insert(column.as_str()) {
                problems.push(format!(
                    "record #{position}: column {column:?} is set more than once"
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RunError::Validation(problems))
    }
}
