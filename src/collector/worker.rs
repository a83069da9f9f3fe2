use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;

use crate::{
    batch::Batch,
    error::StreamError,
    exchanges::adapter::ExchangeAdapter,
    metrics::METRICS,
    sink::publisher::{PublishOutcome, ResilientPublisher},
};

use super::lease::{LeaseGuard, LeaseRegistry};
use super::transport::{StreamConnection, StreamConnector};

/// Lifecycle of one worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Connecting,
    Subscribing,
    Streaming,
    Cancelled,
    Failed,
}

/// How a worker instance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Shutdown was signalled. Never followed by a reconnect.
    Cancelled,

    /// The connection could not be opened, subscribed, or read.
    ///
    /// `streamed` tells whether the subscription went out before the
    /// failure, i.e. the worker reached the Streaming state.
    Failed { error: StreamError, streamed: bool },
}

impl WorkerExit {
    pub fn state(&self) -> WorkerState {
        match self {
            Self::Cancelled => WorkerState::Cancelled,
            Self::Failed { .. } => WorkerState::Failed,
        }
    }
}

/// An open connection paired with the batch it serves.
///
/// The batch lease is released only after the connection is closed.
struct ConnectionLease {
    conn: Box<dyn StreamConnection>,
    guard: LeaseGuard,
}

impl ConnectionLease {
    async fn release(mut self) {
        self.conn.close().await;
        METRICS.ws_connections_active.fetch_sub(1, Ordering::Relaxed);
        log::debug!("batch {} lease released", self.guard.batch());
    }
}

/// Serves exactly one batch over exactly one connection.
///
/// This worker:
/// - Connects to the exchange endpoint
/// - Sends one subscription request for every channel of the batch
/// - Forwards every inbound message, in arrival order, to the publisher
///
/// It never reconnects on its own; that is the supervisor's job.
#[derive(Clone)]
pub struct SubscriptionWorker {
    adapter: Arc<dyn ExchangeAdapter>,
    connector: Arc<dyn StreamConnector>,
    publisher: ResilientPublisher,
    leases: LeaseRegistry,
}

impl SubscriptionWorker {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        connector: Arc<dyn StreamConnector>,
        publisher: ResilientPublisher,
        leases: LeaseRegistry,
    ) -> Self {
        Self {
            adapter,
            connector,
            publisher,
            leases,
        }
    }

    /// Runs one worker instance until cancellation or connection failure.
    ///
    /// Returns only after the connection (if any) is closed.
    pub async fn run(&self, batch: &Batch, cancel: &CancellationToken) -> WorkerExit {
        if cancel.is_cancelled() {
            return WorkerExit::Cancelled;
        }

        let guard = match self.leases.acquire(batch.index()) {
            Ok(guard) => guard,
            Err(error) => {
                log::error!("batch {}: {error}", batch.index());
                return WorkerExit::Failed { error, streamed: false };
            }
        };

        log::debug!("batch {} -> {:?}", batch.index(), WorkerState::Connecting);

        let connected = tokio::select! {
            () = cancel.cancelled() => return WorkerExit::Cancelled,
            res = self.connector.connect() => res,
        };

        let conn = match connected {
            Ok(conn) => conn,
            Err(error) => {
                log::warn!(
                    "batch {} [{}] connect failed: {error}",
                    batch.index(),
                    self.adapter.name()
                );
                return WorkerExit::Failed { error, streamed: false };
            }
        };

        METRICS.ws_connections_active.fetch_add(1, Ordering::Relaxed);
        let mut lease = ConnectionLease { conn, guard };

        let exit = self.serve(batch, lease.conn.as_mut(), cancel).await;
        lease.release().await;

        log::debug!("batch {} -> {:?}", batch.index(), exit.state());
        exit
    }

    async fn serve(
        &self,
        batch: &Batch,
        conn: &mut dyn StreamConnection,
        cancel: &CancellationToken,
    ) -> WorkerExit {
        log::debug!("batch {} -> {:?}", batch.index(), WorkerState::Subscribing);

        let sub = self
            .adapter
            .build_subscribe_message(batch, batch.index() as u64 + 1);

        let sent = tokio::select! {
            () = cancel.cancelled() => return WorkerExit::Cancelled,
            res = conn.send_text(sub.to_string()) => res,
        };

        if let Err(error) = sent {
            METRICS.subscription_errors.fetch_add(1, Ordering::Relaxed);
            log::warn!("batch {} subscription failed: {error}", batch.index());
            return WorkerExit::Failed { error, streamed: false };
        }

        METRICS.subscriptions_sent.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "batch {} subscribed to {} channels",
            batch.index(),
            batch.len()
        );
        log::debug!("batch {} -> {:?}", batch.index(), WorkerState::Streaming);

        loop {
            if cancel.is_cancelled() {
                return WorkerExit::Cancelled;
            }

            let received = tokio::select! {
                () = cancel.cancelled() => return WorkerExit::Cancelled,
                res = conn.next_message() => res,
            };

            match received {
                Ok(payload) => {
                    METRICS.messages_received.fetch_add(1, Ordering::Relaxed);

                    // Abandoned messages are already logged by the publisher
                    if let PublishOutcome::Cancelled { .. } =
                        self.publisher.publish(&payload, cancel).await
                    {
                        return WorkerExit::Cancelled;
                    }
                }
                Err(error) => {
                    log::warn!("batch {} read failed: {error}", batch.index());
                    return WorkerExit::Failed { error, streamed: true };
                }
            }
        }
    }
}
