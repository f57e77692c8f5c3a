use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reconciler::{PollOutcome, Reconciler};

/// Drives `Reconciler::poll` on a fixed period.
///
/// The first poll fires immediately. Each tick awaits its poll before the
/// next tick is taken, and ticks missed while a slow poll was running are
/// skipped rather than bunched up.
pub fn start(reconciler: Reconciler, poll_interval: Duration) -> EngineHandle {
    let cancel_token = reconciler.shutdown_token();
    let handle = tokio::spawn(poll_loop(reconciler, poll_interval, cancel_token.clone()));
    tracing::info!(interval_secs = poll_interval.as_secs(), "notification polling started");
    EngineHandle {
        handle: Some(handle),
        cancel_token,
    }
}

/// Owns the polling task. Dropping the handle stops polling; `shutdown`
/// additionally waits for the task to exit.
pub struct EngineHandle {
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl EngineHandle {
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.cancel_token.cancel();
        match self.handle.take() {
            Some(handle) => handle.await,
            None => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop(reconciler: Reconciler, poll_interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                tracing::info!("notification polling stopped");
                break;
            }
            _ = ticker.tick() => {
                match reconciler.poll().await {
                    PollOutcome::Merged { added, dropped } => {
                        tracing::debug!(added, dropped, "scheduled poll finished");
                    }
                    PollOutcome::Skipped => tracing::debug!("scheduled poll skipped"),
                    // Already reported by the reconciler.
                    PollOutcome::Failed(_) => {}
                    PollOutcome::Discarded => break,
                }
            }
        }
    }
}
