//! Sink layer
//!
//! A `Sink` accepts one opaque payload per call and reports whether it
//! was accepted. Implementations are shared by every batch worker and
//! must be safe for concurrent use; no locking is added above them.
//!
//! Retry and backoff live in `publisher`, never in the sinks themselves.

pub mod demo;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod publisher;

use std::sync::Arc;

use crate::config::SinkConfig;
use crate::error::SinkError;

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn publish(&self, payload: &[u8]) -> Result<(), SinkError>;
}

/// Builds the sink selected by configuration.
///
/// DEMO MODE:
/// - No broker connection
/// - Payloads are logged only
pub fn build_sink(cfg: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
    if cfg.demo {
        log::warn!("sink running in DEMO mode, nothing is published");
        return Ok(Arc::new(demo::DemoSink));
    }

    broker_sink(cfg)
}

#[cfg(feature = "kafka")]
fn broker_sink(cfg: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
    let sink = kafka::KafkaSink::new(&cfg.brokers, &cfg.topic, cfg.send_timeout())?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "kafka"))]
fn broker_sink(_cfg: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
    Err(SinkError::Unavailable(
        "built without the `kafka` feature; enable it or set sink.demo".into(),
    ))
}
