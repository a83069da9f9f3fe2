use crate::error::SinkError;

use super::Sink;

/// Sink used for local runs without a broker.
///
/// Every payload is accepted and logged at debug level.
pub struct DemoSink;

#[async_trait::async_trait]
impl Sink for DemoSink {
    async fn publish(&self, payload: &[u8]) -> Result<(), SinkError> {
        log::debug!("DEMO -> {}", String::from_utf8_lossy(payload));
        Ok(())
    }
}
