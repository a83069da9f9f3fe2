use thiserror::Error;

// ------------------------------------------------------------
// Error taxonomy
// ------------------------------------------------------------
//
// Each layer owns its error type. Failures are absorbed by the
// smallest unit that can handle them:
//
// - SinkError:      per message, retried by the publisher
// - StreamError:    per batch, handled by the supervisor
// - DiscoveryError: fatal, escalates to the whole run
// - ConfigError:    fatal, rejected before any I/O
//

/// Invalid configuration detected before the pipeline starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be positive")]
    ZeroBatchSize,

    #[error("publisher max_attempts must be positive")]
    ZeroPublishAttempts,

    #[error("reconnect max_attempts must be positive when set")]
    ZeroReconnectAttempts,

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// The instrument universe could not be fetched or decoded.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("instrument request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("instrument endpoint returned status {0}")]
    Status(u16),

    #[error("instrument source error: {0}")]
    Source(String),
}

/// Failure of a single streaming connection.
///
/// Every variant terminates the current worker instance and hands the
/// batch back to its supervisor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("batch {0} already holds a live connection")]
    LeaseHeld(usize),
}

/// A single publish call rejected by the sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("kafka delivery failed: {0}")]
    Kafka(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort the whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
