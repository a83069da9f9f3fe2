use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration loaded from `config.json`.
//
// It defines:
// - Exchange endpoints and the asset class to discover
// - How many instruments share one WebSocket connection
// - Sink (Kafka) settings and publish retry policy
// - Reconnection cool-down
// - Optional debug configuration
//
// Every section has defaults, so an empty object (or no file at
// all) yields the baseline setup.
//
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub chunking: ChunkingConfig,
    pub sink: SinkConfig,
    pub reconnect: ReconnectConfig,
    pub debug: Option<DebugConfig>,
}

// ------------------------------------------------------------
// Exchange configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Adapter identifier (e.g. "deribit")
    pub name: String,

    /// Streaming endpoint. Empty means the adapter's own endpoint.
    pub ws_url: String,

    /// REST base used for instrument discovery
    pub rest_url: String,

    /// Asset class selector (e.g. "BTC", "ETH")
    pub currency: String,

    /// Instrument kind to discover
    pub kind: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: "deribit".into(),
            ws_url: String::new(),
            rest_url: "https://test.deribit.com/api/v2".into(),
            currency: "BTC".into(),
            kind: "option".into(),
        }
    }
}

impl ExchangeConfig {
    /// Configured streaming endpoint, or `fallback` when none is set.
    pub fn ws_url_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        let url = self.ws_url.trim();
        if url.is_empty() { fallback } else { url }
    }
}

// ------------------------------------------------------------
// Chunking configuration
// ------------------------------------------------------------
//
// Exchanges cap the number of channels per connection. Each
// connection serves at most this many instruments.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub instruments_per_connection: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            instruments_per_connection: 50,
        }
    }
}

// ------------------------------------------------------------
// Sink configuration
// ------------------------------------------------------------
//
// Notes:
// - `demo` disables Kafka; payloads are only logged.
// - Publish retries: `max_attempts` calls in total, the delay
//   after failed attempt k is k * backoff_unit_ms.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SinkConfig {
    pub brokers: String,
    pub topic: String,
    pub demo: bool,
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
    pub send_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".into(),
            topic: "deribitOrderbook".into(),
            demo: false,
            max_attempts: 5,
            backoff_unit_ms: 2_000,
            send_timeout_ms: 5_000,
        }
    }
}

impl SinkConfig {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

// ------------------------------------------------------------
// Reconnect configuration
// ------------------------------------------------------------
//
// `max_attempts` caps consecutive failed workers per batch.
// Unset means the batch retries until the run is cancelled.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReconnectConfig {
    pub cooldown_ms: u64,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 5_000,
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// Raises the default log level to debug
    pub log: Option<bool>,
}

impl Config {
    /// Reads a JSON configuration file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `RELAY_CURRENCY` on top of the file settings.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(currency) = std::env::var("RELAY_CURRENCY") {
            if !currency.trim().is_empty() {
                self.exchange.currency = currency.trim().to_uppercase();
            }
        }
        self
    }

    pub fn debug_log(&self) -> bool {
        self.debug
            .as_ref()
            .map_or(false, |d| d.log.unwrap_or(false))
    }

    /// Rejects settings that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.instruments_per_connection == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.sink.max_attempts == 0 {
            return Err(ConfigError::ZeroPublishAttempts);
        }
        if self.reconnect.max_attempts == Some(0) {
            return Err(ConfigError::ZeroReconnectAttempts);
        }
        if self.exchange.currency.trim().is_empty() {
            return Err(ConfigError::Missing("exchange.currency"));
        }
        if !self.sink.demo && self.sink.topic.trim().is_empty() {
            return Err(ConfigError::Missing("sink.topic"));
        }
        Ok(())
    }
}
