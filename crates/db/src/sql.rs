//! SQL text for the loader's statements.
//!
//! Identifiers are validated before a run starts; they are still always
//! double-quoted here so reserved words work as column names.

use rowseed_core::record::{FieldValue, ImportRecord, TargetTable};

/// Quote an identifier for PostgreSQL, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn table_exists_sql() -> &'static str {
    "SELECT EXISTS ( \
         SELECT 1 FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name = $1 \
     )"
}

/// Whether a non-partial, immediately checked unique index covers exactly
/// column `$2` of table `$1`. Primary keys and `UNIQUE` constraints both
/// show up here, and only such an index can arbitrate `ON CONFLICT (col)`.
pub fn key_is_unique_sql() -> &'static str {
    "SELECT EXISTS ( \
         SELECT 1 FROM pg_index i \
         JOIN pg_class c ON c.oid = i.indrelid \
         JOIN pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = i.indkey[0] \
         WHERE n.nspname = current_schema() AND c.relname = $1 AND a.attname = $2 \
           AND i.indisunique AND i.indimmediate AND i.indisvalid \
           AND i.indnkeyatts = 1 AND i.indpred IS NULL \
     )"
}

pub fn count_rows_sql(table: &TargetTable) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(&table.name))
}

pub fn key_exists_sql(table: &TargetTable) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
        quote_ident(&table.name),
        quote_ident(&table.key_column)
    )
}

/// A conditional insert and the values to bind, in placeholder order.
///
/// `$1` is always the natural key. `NULL` fields are written as literals so
/// the column's declared type applies instead of the bound parameter's.
#[derive(Debug)]
pub struct InsertStatement<'r> {
    pub sql: String,
    pub params: Vec<&'r FieldValue>,
    pub created_at: Option<&'r rowseed_core::types::Timestamp>,
}

pub fn insert_if_absent_sql<'r>(table: &TargetTable, record: &'r ImportRecord) -> InsertStatement<'r> {
    let mut columns = vec![quote_ident(&table.key_column)];
    let mut values = vec!["$1".to_string()];
    let mut params = Vec::with_capacity(record.fields.len());
    let mut next_placeholder = 2;

    for (column, value) in &record.fields {
        columns.push(quote_ident(column));
        if value.is_null() {
            values.push("NULL".to_string());
        } else {
            values.push(format!("${next_placeholder}"));
            next_placeholder += 1;
            params.push(value);
        }
    }

    if record.created_at.is_some() {
        columns.push(quote_ident(&table.created_at_column));
        values.push(format!("${next_placeholder}"));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING",
        quote_ident(&table.name),
        columns.join(", "),
        values.join(", "),
        quote_ident(&table.key_column),
    );

    InsertStatement {
        sql,
        params,
        created_at: record.created_at.as_ref(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn schools() -> TargetTable {
        TargetTable::new("schools", "code")
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("schools"), "\"schools\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_key_is_unique_requires_single_column_full_index() {
        let sql = key_is_unique_sql();
        assert!(sql.contains("c.relname = $1 AND a.attname = $2"));
        assert!(sql.contains("i.indnkeyatts = 1"));
        assert!(sql.contains("i.indpred IS NULL"));
    }

    #[test]
    fn test_insert_numbers_placeholders_in_field_order() {
        let record = ImportRecord::new("SCH-001")
            .field("name", "North")
            .field("capacity", 300);
        let stmt = insert_if_absent_sql(&schools(), &record);

        assert_eq!(
            stmt.sql,
            "INSERT INTO \"schools\" (\"code\", \"name\", \"capacity\") VALUES ($1, $2, $3) \
             ON CONFLICT (\"code\") DO NOTHING"
        );
        assert_eq!(stmt.params.len(), 2);
        assert!(stmt.created_at.is_none());
    }

    #[test]
    fn test_insert_inlines_nulls() {
        let record = ImportRecord::new("SCH-001")
            .field("description", None::<String>)
            .field("name", "North");
        let stmt = insert_if_absent_sql(&schools(), &record);

        assert!(stmt.sql.contains("VALUES ($1, NULL, $2)"));
        assert_eq!(stmt.params, vec![&FieldValue::Text("North".into())]);
    }

    #[test]
    fn test_insert_appends_created_at_override() {
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let record = ImportRecord::new("SCH-001").field("name", "North").created_at(at);
        let stmt = insert_if_absent_sql(&schools().with_created_at_column("opened_at"), &record);

        assert!(stmt.sql.contains("(\"code\", \"name\", \"opened_at\") VALUES ($1, $2, $3)"));
        assert_eq!(stmt.created_at, Some(&at));
    }

    #[test]
    fn test_count_and_key_lookup() {
        assert_eq!(count_rows_sql(&schools()), "SELECT COUNT(*) FROM \"schools\"");
        assert_eq!(
            key_exists_sql(&schools()),
            "SELECT EXISTS (SELECT 1 FROM \"schools\" WHERE \"code\" = $1)"
        );
    }
}
