use serde_json::{Value, json};

use crate::{
    batch::Batch,
    error::DiscoveryError,
    schema::InstrumentsResponse,
};

use super::adapter::{ExchangeAdapter, InstrumentSource};

/// Update interval suffix of the order book channel.
const BOOK_INTERVAL: &str = "100ms";

/// Deribit WebSocket adapter
///
/// Deribit API v2 (JSON-RPC over WebSocket):
/// https://docs.deribit.com/#public-subscribe
///
/// DESIGN:
/// - Pure protocol translation
/// - No reconnect logic
/// - No state
pub struct DeribitAdapter;

impl ExchangeAdapter for DeribitAdapter {

    fn name(&self) -> &'static str {
        "deribit"
    }

    fn ws_url(&self) -> &'static str {
        "wss://test.deribit.com/ws/api/v2"
    }

    fn channel_name(&self, instrument: &str) -> String {
        format!("book.{instrument}.{BOOK_INTERVAL}")
    }

    fn build_subscribe_message(&self, batch: &Batch, request_id: u64) -> Value {
        let channels: Vec<String> = batch
            .instruments()
            .iter()
            .map(|i| self.channel_name(i))
            .collect();

        json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": "public/subscribe",
            "params": { "channels": channels }
        })
    }
}

/// Instrument discovery over Deribit's public REST API.
pub struct DeribitInstrumentSource {
    client: reqwest::Client,
    rest_url: String,
    kind: String,
}

impl DeribitInstrumentSource {
    pub fn new(rest_url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: rest_url.into(),
            kind: kind.into(),
        }
    }

    fn instruments_url(&self, currency: &str) -> String {
        format!(
            "{}/public/get_instruments?currency={}&kind={}",
            self.rest_url.trim_end_matches('/'),
            currency,
            self.kind
        )
    }
}

#[async_trait::async_trait]
impl InstrumentSource for DeribitInstrumentSource {
    async fn list_instruments(&self, currency: &str) -> Result<Vec<String>, DiscoveryError> {
        let url = self.instruments_url(currency);
        log::debug!("fetching instruments from {url}");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(DiscoveryError::Status(resp.status().as_u16()));
        }

        let body: InstrumentsResponse = resp.json().await?;
        Ok(body
            .result
            .into_iter()
            .map(|i| i.instrument_name)
            .collect())
    }
}
