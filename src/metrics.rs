use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics for the relay.
///
/// Purpose:
/// - Track supervised batches and live connections
/// - Track throughput (received / published / dropped messages)
/// - Track reconnect and subscription activity
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update
/// - Safe in async + multithreaded contexts
#[derive(Default)]
pub struct RuntimeMetrics {
    // Supervision
    pub batches_active: AtomicUsize,
    pub ws_connections_active: AtomicUsize,
    pub ws_reconnects: AtomicUsize,

    // Subscriptions
    pub subscriptions_sent: AtomicUsize,
    pub subscription_errors: AtomicUsize,

    // Throughput
    pub messages_received: AtomicUsize,
    pub messages_published: AtomicUsize,
    pub publish_retries: AtomicUsize,
    pub dropped_messages: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary for the periodic reporter.
    pub fn summary(&self) -> String {
        format!(
            concat!(
                "batches={} ws={} recv={} sent={} retries={} dropped={} ",
                "reconnects={} sub_send={} sub_send_err={}"
            ),
            self.batches_active.load(Ordering::Relaxed),
            self.ws_connections_active.load(Ordering::Relaxed),
            self.messages_received.load(Ordering::Relaxed),
            self.messages_published.load(Ordering::Relaxed),
            self.publish_retries.load(Ordering::Relaxed),
            self.dropped_messages.load(Ordering::Relaxed),
            self.ws_reconnects.load(Ordering::Relaxed),
            self.subscriptions_sent.load(Ordering::Relaxed),
            self.subscription_errors.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));
