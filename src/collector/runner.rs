use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    batch::{self, Batch},
    config::Config,
    error::PipelineError,
    exchanges::adapter::{ExchangeAdapter, InstrumentSource},
    metrics::METRICS,
    sink::{Sink, publisher::ResilientPublisher},
};

use super::lease::LeaseRegistry;
use super::supervisor::{BatchOutcome, ReconnectSupervisor};
use super::transport::StreamConnector;
use super::worker::SubscriptionWorker;

/// Terminal state of one batch, as collected by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub index: usize,
    pub instruments: usize,
    pub outcome: BatchOutcome,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub instruments: usize,
    pub batches: Vec<BatchReport>,

    /// Batch tasks that panicked instead of returning an outcome.
    pub panicked: usize,
}

/// Orchestrates one relay run.
///
/// This type is responsible for:
/// - Fetching the instrument universe
/// - Partitioning it into connection-sized batches
/// - Starting one supervised worker per batch
/// - Waiting for every batch to reach a terminal state
///
/// DESIGN:
/// - One batch → one WebSocket connection
/// - All batches run concurrently and share only the sink,
///   the lease registry and the cancellation token
/// - Failures are isolated per batch
///
pub struct Pipeline {
    config: Config,
    source: Arc<dyn InstrumentSource>,
    adapter: Arc<dyn ExchangeAdapter>,
    connector: Arc<dyn StreamConnector>,
    sink: Arc<dyn Sink>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        source: Arc<dyn InstrumentSource>,
        adapter: Arc<dyn ExchangeAdapter>,
        connector: Arc<dyn StreamConnector>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            config,
            source,
            adapter,
            connector,
            sink,
        }
    }

    /// Runs until every batch is terminal.
    ///
    /// Only configuration and discovery errors abort the run; they are
    /// reported before any connection is opened.
    pub async fn run(&self, cancel: CancellationToken) -> Result<PipelineReport, PipelineError> {
        self.config.validate()?;

        let currency = &self.config.exchange.currency;
        let instruments = self.source.list_instruments(currency).await?;

        let batches = batch::partition(
            &instruments,
            self.config.chunking.instruments_per_connection,
        )?;

        log::info!(
            "Found {} {} instruments, subscribing with {} connections on {}",
            instruments.len(),
            currency,
            batches.len(),
            self.adapter.name()
        );

        if batches.is_empty() {
            log::warn!("no instruments to subscribe, nothing to do");
        }

        let supervisor = self.supervisor();
        let mut tasks = JoinSet::new();

        for batch in batches {
            let supervisor = supervisor.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move { run_batch(supervisor, batch, cancel).await });
        }

        let mut report = PipelineReport {
            instruments: instruments.len(),
            ..PipelineReport::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(batch_report) => report.batches.push(batch_report),
                Err(e) => {
                    log::error!("batch task failed: {e}");
                    report.panicked += 1;
                }
            }
        }

        report.batches.sort_by_key(|b| b.index);
        Ok(report)
    }

    fn supervisor(&self) -> ReconnectSupervisor {
        let publisher = ResilientPublisher::from_config(self.sink.clone(), &self.config.sink);
        let worker = SubscriptionWorker::new(
            self.adapter.clone(),
            self.connector.clone(),
            publisher,
            LeaseRegistry::new(),
        );

        ReconnectSupervisor::from_config(worker, &self.config.reconnect)
    }
}

async fn run_batch(
    supervisor: ReconnectSupervisor,
    batch: Batch,
    cancel: CancellationToken,
) -> BatchReport {
    let index = batch.index();
    let instruments = batch.len();

    METRICS.batches_active.fetch_add(1, Ordering::Relaxed);
    let outcome = supervisor.supervise(batch, cancel).await;
    METRICS.batches_active.fetch_sub(1, Ordering::Relaxed);

    log::info!("batch {index} finished: {outcome:?}");

    BatchReport {
        index,
        instruments,
        outcome,
    }
}
