//! Signal policy: the first signal stops the run between records, a second
//! one gives up on waiting.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first signal received from `signals`.
///
/// Returns `true` when a second signal arrives, meaning the caller should
/// exit immediately instead of waiting for the record in flight. Returns
/// `false` if the signal source closes first.
pub async fn watch_signals(
    cancel: CancellationToken,
    mut signals: mpsc::Receiver<&'static str>,
) -> bool {
    let Some(signal) = signals.recv().await else {
        return false;
    };
    tracing::info!(signal, "Stopping after the current record; signal again to abort");
    cancel.cancel();

    let Some(signal) = signals.recv().await else {
        return false;
    };
    tracing::warn!(signal, "Second signal received, aborting without waiting");
    true
}
