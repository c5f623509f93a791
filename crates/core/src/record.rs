//! Import candidates and the table they are loaded into.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::Timestamp;

// ── Constants ────────────────────────────────────────────────────────

/// PostgreSQL truncates identifiers beyond this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Default column receiving [`ImportRecord::created_at`] overrides.
pub const DEFAULT_CREATED_AT_COLUMN: &str = "created_at";

/// Plain, unquoted SQL identifier.
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Returns `true` if `name` is safe to splice into SQL as a quoted identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER_RE.is_match(name)
}

// ── Field values ─────────────────────────────────────────────────────

/// A scalar column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

// ── Records ──────────────────────────────────────────────────────────

/// One row to ensure exists in the target table, identified by its natural key.
///
/// Records are built once and never mutated by the importer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub natural_key: String,
    /// Column name -> value, in insertion order.
    pub fields: Vec<(String, FieldValue)>,
    /// Written to the table's created-at column when set; otherwise the
    /// column default applies.
    pub created_at: Option<Timestamp>,
}

impl ImportRecord {
    pub fn new(natural_key: impl Into<String>) -> Self {
        Self {
            natural_key: natural_key.into(),
            fields: Vec::new(),
            created_at: None,
        }
    }

    /// Append a column value.
    pub fn field(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((column.into(), value.into()));
        self
    }

    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Look up a field by column name.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

// ── Target table ─────────────────────────────────────────────────────

/// The table records are loaded into.
///
/// The table must already exist with a uniqueness constraint on
/// `key_column`; the loader never creates or alters it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetTable {
    pub name: String,
    pub key_column: String,
    pub created_at_column: String,
}

impl TargetTable {
    pub fn new(name: impl Into<String>, key_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_column: key_column.into(),
            created_at_column: DEFAULT_CREATED_AT_COLUMN.to_string(),
        }
    }

    pub fn with_created_at_column(mut self, column: impl Into<String>) -> Self {
        self.created_at_column = column.into();
        self
    }

    /// Identifier problems with the table definition itself.
    pub fn identifier_errors(&self) -> Vec<String> {
        [
            ("table name", &self.name),
            ("key column", &self.key_column),
            ("created-at column", &self.created_at_column),
        ]
        .into_iter()
        .filter(|(_, ident)| !is_valid_identifier(ident))
        .map(|(what, ident)| format!("invalid {what} identifier: {ident:?}"))
        .collect()
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (key: {})", self.name, self.key_column)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for ident in ["schools", "_private", "created_at", "Col9"] {
            assert!(is_valid_identifier(ident), "ident: {ident}");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for ident in ["", "9lives", "drop table", "a;b", "na\"me", "schools.code"] {
            assert!(!is_valid_identifier(ident), "ident: {ident}");
        }
    }

    #[test]
    fn test_identifier_length_limit() {
        assert!(is_valid_identifier(&"a".repeat(MAX_IDENTIFIER_LEN)));
        assert!(!is_valid_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)));
    }

    #[test]
    fn test_builder_preserves_field_order() {
        let record = ImportRecord::new("SCH-001")
            .field("name", "North")
            .field("capacity", 300)
            .field("description", None::<String>);

        let columns: Vec<&str> = record.fields.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, ["name", "capacity", "description"]);
        assert_eq!(record.get("capacity"), Some(&FieldValue::Int(300)));
        assert!(record.get("description").is_some_and(FieldValue::is_null));
        assert!(record.get("region").is_none());
    }

    #[test]
    fn test_target_table_defaults() {
        let table = TargetTable::new("schools", "code");
        assert_eq!(table.created_at_column, "created_at");
        assert!(table.identifier_errors().is_empty());
    }

    #[test]
    fn test_target_table_reports_bad_identifiers() {
        let table = TargetTable::new("schools; --", "code").with_created_at_column("");
        let errors = table.identifier_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("table name"));
        assert!(errors[1].contains("created-at column"));
    }
}
