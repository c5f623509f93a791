//! One complete load: run the import, print the report, pick an exit code.

use tokio_util::sync::CancellationToken;

use rowseed_core::report::{render_partial, render_report};
use rowseed_core::store::ConnectionProvider;
use rowseed_core::{execute, ImportRecord, RunError, TargetTable};
use rowseed_db::ConnectionSettings;

use crate::exit::{connection_troubleshooting, exit_code, precondition_guidance, EXIT_OK};

/// Load `records` into `table` through `provider` and report to stdout/stderr.
///
/// Returns the process exit code.
pub async fn load<P>(
    provider: &P,
    settings: &ConnectionSettings,
    table: &TargetTable,
    records: &[ImportRecord],
    cancel: CancellationToken,
) -> u8
where
    P: ConnectionProvider,
{
    match execute(provider, table, records, cancel).await {
        Ok(run) => {
            print!("{}", render_report(&run));
            tracing::info!(
                summary = %serde_json::to_string(&run.summary).unwrap_or_default(),
                "Load complete"
            );
            EXIT_OK
        }
        Err(err) => {
            report_failure(&err, settings, records.len());
            exit_code(&err)
        }
    }
}

fn report_failure(err: &RunError, settings: &ConnectionSettings, total: usize) {
    tracing::error!(error = %err, "Load failed");

    match err {
        RunError::Validation(problems) => {
            eprintln!("Record source is invalid; nothing was written:");
            for problem in problems {
                eprintln!("  - {problem}");
            }
        }
        RunError::Precondition { table, problem } => {
            eprintln!("{}", precondition_guidance(table, problem, settings));
        }
        RunError::Connection { .. } => {
            eprintln!("{err}\n");
            eprintln!("{}", connection_troubleshooting(settings));
        }
        RunError::Query { .. } | RunError::Interrupted { .. } => {
            eprintln!("{err}");
        }
    }

    if let Some(partial) = err.partial() {
        eprint!("\n{}", render_partial(partial, Some(total)));
    }
}
