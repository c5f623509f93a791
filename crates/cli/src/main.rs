//! `rowseed` -- load the fixed school dataset into the `schools` table.
//!
//! Safe to run repeatedly: rows whose code already exists are skipped.
//! Ctrl-C stops after the current record; a second Ctrl-C exits at once.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default     | Description              |
//! |---------------------------|----------|-------------|--------------------------|
//! | `DB_HOST`                 | no       | `localhost` | Database host            |
//! | `DB_PORT`                 | no       | `5432`      | Database port            |
//! | `DB_USER`                 | no       | `postgres`  | Database user            |
//! | `DB_PASSWORD`             | no       | (empty)     | Database password        |
//! | `DB_NAME`                 | no       | `schools`   | Database name            |
//! | `DB_CONNECT_TIMEOUT_SECS` | no       | `10`        | Connect timeout, seconds |

use std::process::ExitCode;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rowseed_cli::config::LoaderConfig;
use rowseed_cli::dataset::{school_records, schools_table};
use rowseed_cli::exit::{EXIT_CONFIG, EXIT_INTERRUPTED};
use rowseed_cli::load::load;
use rowseed_cli::shutdown::watch_signals;
use rowseed_db::PgConnectionProvider;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rowseed=info,rowseed_cli=info,rowseed_core=info,rowseed_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match LoaderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("Configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    tracing::info!(
        host = %config.db.host,
        port = config.db.port,
        database = %config.db.database,
        "Loaded configuration"
    );

    // First signal: finish the record in flight, release the session, exit
    // 130. Second signal: exit 130 right away.
    let cancel = CancellationToken::new();
    let signals = forward_signals();
    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if watch_signals(cancel, signals).await {
                std::process::exit(i32::from(EXIT_INTERRUPTED));
            }
        }
    });

    let provider = PgConnectionProvider::new(&config.db);
    let table = schools_table();
    let records = school_records();

    let code = load(&provider, &config.db, &table, &records, cancel).await;

    signal_task.abort();
    ExitCode::from(code)
}

/// Forward SIGINT (Ctrl-C) and SIGTERM into a channel, one message per signal.
///
/// The handlers stay installed for the life of the process, so a repeated
/// signal is delivered here rather than swallowed.
fn forward_signals() -> mpsc::Receiver<&'static str> {
    let (tx, rx) = mpsc::channel(2);

    tokio::spawn(async move {
        #[cfg(unix)]
        let mut terminate =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => Some(signal),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    None
                }
            };

        loop {
            #[cfg(unix)]
            let terminated = async {
                if let Some(signal) = terminate.as_mut() {
                    if signal.recv().await.is_some() {
                        return;
                    }
                }
                std::future::pending::<()>().await
            };

            #[cfg(not(unix))]
            let terminated = std::future::pending::<()>();

            let name = tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => "SIGINT",
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
                        return;
                    }
                },
                () = terminated => "SIGTERM",
            };

            if tx.send(name).await.is_err() {
                return;
            }
        }
    });

    rx
}
