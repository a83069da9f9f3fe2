use serde_json::Value;

use crate::batch::Batch;
use crate::error::DiscoveryError;

/// ExchangeAdapter is the protocol layer between:
/// - The generic subscription runtime
/// - Exchange-specific WebSocket APIs
///
/// Each exchange implementation must:
/// - Derive channel names from instrument identifiers
/// - Build the subscription request for one batch
///
/// Message payloads are never parsed: the relay forwards them
/// unmodified.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Adapter instances are shared across all batch workers
///
pub trait ExchangeAdapter: Send + Sync {

    /// Returns the canonical exchange name.
    ///
    /// CONTRACT:
    /// - Must match `exchange.name` in configuration
    fn name(&self) -> &'static str;

    /// Default streaming endpoint for this exchange.
    fn ws_url(&self) -> &'static str;

    /// Channel carrying order book updates for one instrument.
    fn channel_name(&self, instrument: &str) -> String;

    /// Builds the single subscription request sent per connection.
    ///
    /// MUST NOT:
    /// - Perform network I/O
    /// - Mutate shared state
    fn build_subscribe_message(&self, batch: &Batch, request_id: u64) -> Value;
}

/// Supplies the instrument universe for an asset class.
///
/// Called once per run, before any batch starts. An error is fatal.
#[async_trait::async_trait]
pub trait InstrumentSource: Send + Sync {
    async fn list_instruments(&self, currency: &str) -> Result<Vec<String>, DiscoveryError>;
}
