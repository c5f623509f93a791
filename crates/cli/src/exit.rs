//! Process exit policy and operator guidance.

use rowseed_core::{PreconditionProblem, RunError};
use rowseed_db::ConnectionSettings;

/// Run completed; per-record failures do not change this.
pub const EXIT_OK: u8 = 0;
/// Connection, precondition, query or validation failure.
pub const EXIT_RUN_FAILED: u8 = 1;
/// Invalid configuration.
pub const EXIT_CONFIG: u8 = 2;
/// Interrupted by a signal (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn exit_code(err: &RunError) -> u8 {
    match err {
        RunError::Interrupted { .. } => EXIT_INTERRUPTED,
        RunError::Validation(_)
        | RunError::Precondition { .. }
        | RunError::Connection { .. }
        | RunError::Query { .. } => EXIT_RUN_FAILED,
    }
}

/// Checklist printed when the database cannot be reached.
pub fn connection_troubleshooting(settings: &ConnectionSettings) -> String {
    format!(
        "Could not connect to the database.\n\
         \n\
         Troubleshooting:\n\
         \x20 1. Is the server running and reachable at {host}:{port}? (DB_HOST / DB_PORT)\n\
         \x20 2. Are the credentials for user \"{user}\" correct? (DB_USER / DB_PASSWORD)\n\
         \x20 3. Does the database \"{database}\" exist? (DB_NAME)\n\
         \x20 4. Is a firewall or network policy blocking the connection?\n\
         \x20 5. Does the server answer within {timeout}s? (DB_CONNECT_TIMEOUT_SECS)",
        host = settings.host,
        port = settings.port,
        user = settings.user,
        database = settings.database,
        timeout = settings.connect_timeout.as_secs(),
    )
}

/// Guidance printed when the target table is missing or not keyed uniquely.
pub fn precondition_guidance(
    table: &str,
    problem: &PreconditionProblem,
    settings: &ConnectionSettings,
) -> String {
    match problem {
        PreconditionProblem::MissingTable => format!(
            "Table \"{table}\" does not exist in database \"{database}\".\n\
             This tool does not create tables; apply the schema first, then re-run.",
            database = settings.database,
        ),
        PreconditionProblem::KeyNotUnique { column } => format!(
            "Table \"{table}\" in database \"{database}\" has no unique constraint on \"{column}\".\n\
             Existing rows cannot be detected without one; add \
             UNIQUE (\"{column}\") to the table, then re-run.",
            database = settings.database,
        ),
    }
}
