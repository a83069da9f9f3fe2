// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:    Configuration structs loaded from JSON
// - error:     Error types per layer
// - schema:    Wire types (JSON-RPC requests, instrument catalog)
// - batch:     Instrument partitioning into connection-sized batches
// - exchanges: Exchange adapters, instrument sources, registry
// - sink:      Sink trait, Kafka / demo sinks, resilient publisher
// - collector: Per-batch workers, supervision and the pipeline
// - metrics:   Lock-free runtime counters
//
pub mod batch;
pub mod collector;
pub mod config;
pub mod error;
pub mod exchanges;
pub mod metrics;
pub mod schema;
pub mod sink;

pub use batch::{Batch, partition};
pub use collector::runner::{BatchReport, Pipeline, PipelineReport};
pub use collector::supervisor::BatchOutcome;
pub use config::Config;
pub use error::{ConfigError, DiscoveryError, PipelineError, SinkError, StreamError};
