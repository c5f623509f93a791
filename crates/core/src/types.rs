/// Row counts as reported by `COUNT(*)` (PostgreSQL BIGINT).
pub type RowCount = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
