use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::SinkConfig;
use crate::error::SinkError;
use crate::metrics::METRICS;

use super::Sink;

/// Result of publishing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Accepted by the sink on the given attempt.
    Delivered { attempts: u32 },

    /// Every attempt failed; the message is dropped.
    Abandoned { attempts: u32, error: SinkError },

    /// Shutdown was signalled while waiting between attempts.
    Cancelled { attempts: u32 },
}

/// Bounded retry-with-backoff wrapper around a shared `Sink`.
///
/// Behavior:
/// - At most `max_attempts` calls per message
/// - After failed attempt k, waits k * `backoff_unit`
/// - No wait after the final attempt
/// - The caller is blocked for the whole sequence, which stalls
///   only the calling batch's read loop
///
/// Retries may deliver the same payload more than once.
#[derive(Clone)]
pub struct ResilientPublisher {
    sink: Arc<dyn Sink>,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl ResilientPublisher {
    pub fn new(sink: Arc<dyn Sink>, max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            sink,
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn from_config(sink: Arc<dyn Sink>, cfg: &SinkConfig) -> Self {
        Self::new(sink, cfg.max_attempts, cfg.backoff_unit())
    }

    /// Delay inserted after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    pub async fn publish(&self, payload: &[u8], cancel: &CancellationToken) -> PublishOutcome {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.sink.publish(payload).await {
                Ok(()) => {
                    METRICS.messages_published.fetch_add(1, Ordering::Relaxed);
                    if attempt > 1 {
                        log::info!("publish succeeded on attempt {attempt}");
                    }
                    return PublishOutcome::Delivered { attempts: attempt };
                }
                Err(e) => e,
            };

            log::warn!("publish attempt {attempt}/{} failed: {error}", self.max_attempts);

            if attempt >= self.max_attempts {
                METRICS.dropped_messages.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "dropping message after {attempt} failed publish attempts: {error}"
                );
                return PublishOutcome::Abandoned { attempts: attempt, error };
            }

            METRICS.publish_retries.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                () = cancel.cancelled() => {
                    METRICS.dropped_messages.fetch_add(1, Ordering::Relaxed);
                    return PublishOutcome::Cancelled { attempts: attempt };
                }
                () = sleep(self.backoff(attempt)) => {}
            }
        }
    }
}
