//! Mapping of sqlx errors onto [`StoreError`].

use rowseed_core::StoreError;

/// PostgreSQL unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE classes/codes that mean the session itself is unusable:
/// connection exceptions (08), invalid authorization (28), unknown database
/// (3D000) and server shutdown (57P0x).
fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || code.starts_with("28") || code == "3D000" || code.starts_with("57P0")
}

/// Whether `err` means the session can no longer be used.
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| is_connection_sqlstate(&code)),
        _ => false,
    }
}

/// Whether `err` is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Human-readable detail for a failed statement.
pub fn describe(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some(constraint) => format!("{} (constraint {constraint})", db_err.message()),
            None => db_err.message().to_string(),
        },
        other => other.to_string(),
    }
}

/// Classify an error raised while opening a session. Always a connection error.
pub fn connect_error(err: &sqlx::Error) -> StoreError {
    StoreError::Connection(describe(err))
}

/// Classify an error from a read-only statement.
pub fn query_error(err: &sqlx::Error) -> StoreError {
    if is_connection_error(err) {
        StoreError::Connection(describe(err))
    } else {
        StoreError::Query(describe(err))
    }
}

/// Classify an error from a per-record insert. Unique violations are
/// resolved by the caller, which knows the key.
pub fn write_error(err: &sqlx::Error) -> StoreError {
    if is_connection_error(err) {
        StoreError::Connection(describe(err))
    } else {
        StoreError::Write(describe(err))
    }
}
