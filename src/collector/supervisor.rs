use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    batch::Batch,
    config::ReconnectConfig,
    error::StreamError,
    metrics::METRICS,
};

use super::worker::{SubscriptionWorker, WorkerExit};

/// Terminal state of one supervised batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Shutdown was signalled. `restarts` counts workers started
    /// after the first one.
    Cancelled { restarts: u64 },

    /// The consecutive failure cap was reached.
    GaveUp { failures: u32, last_error: StreamError },
}

/// Keeps one batch alive across connection failures.
///
/// Loop:
/// - run a worker to completion
/// - on failure wait the cool-down, then start a fresh worker
///
/// GUARANTEES:
/// - A new worker starts only after the previous one returned,
///   so a batch never holds two connections
/// - No new attempt starts once cancellation is observed
///
/// Failures of one batch never affect another.
#[derive(Clone)]
pub struct ReconnectSupervisor {
    worker: SubscriptionWorker,
    cooldown: Duration,
    max_attempts: Option<u32>,
}

impl ReconnectSupervisor {
    pub fn new(worker: SubscriptionWorker, cooldown: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            worker,
            cooldown,
            max_attempts,
        }
    }

    pub fn from_config(worker: SubscriptionWorker, cfg: &ReconnectConfig) -> Self {
        Self::new(worker, cfg.cooldown(), cfg.max_attempts)
    }

    pub async fn supervise(&self, batch: Batch, cancel: CancellationToken) -> BatchOutcome {
        let mut restarts: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            let (error, streamed) = match self.worker.run(&batch, &cancel).await {
                WorkerExit::Cancelled => return BatchOutcome::Cancelled { restarts },
                WorkerExit::Failed { error, streamed } => (error, streamed),
            };

            // A worker that got as far as streaming was healthy
            failures = if streamed { 1 } else { failures + 1 };

            if let Some(max) = self.max_attempts {
                if failures >= max {
                    log::error!(
                        "batch {} gave up after {failures} consecutive failures: {error}",
                        batch.index()
                    );
                    return BatchOutcome::GaveUp { failures, last_error: error };
                }
            }

            log::warn!(
                "batch {} lost its connection ({error}), reconnecting in {:?}",
                batch.index(),
                self.cooldown
            );

            tokio::select! {
                () = cancel.cancelled() => return BatchOutcome::Cancelled { restarts },
                () = sleep(self.cooldown) => {}
            }

            if cancel.is_cancelled() {
                return BatchOutcome::Cancelled { restarts };
            }

            restarts += 1;
            METRICS.ws_reconnects.fetch_add(1, Ordering::Relaxed);
        }
    }
}
