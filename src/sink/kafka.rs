use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::error::SinkError;

use super::Sink;

/// Kafka sink backed by rdkafka's `FutureProducer`.
///
/// The producer is internally thread-safe, so a single instance is
/// shared by every batch worker.
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaSink {
    /// Creates a producer acknowledged by the partition leader (acks=1).
    pub fn new(brokers: &str, topic: &str, send_timeout: Duration) -> Result<Self, SinkError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "1")
            .set("message.timeout.ms", send_timeout.as_millis().to_string())
            .create()
            .map_err(|e| SinkError::Kafka(e.to_string()))?;

        log::info!("Created Kafka producer for {} (topic {})", brokers, topic);

        Ok(Self {
            producer,
            topic: topic.to_string(),
            send_timeout,
        })
    }
}

#[async_trait::async_trait]
impl Sink for KafkaSink {
    async fn publish(&self, payload: &[u8]) -> Result<(), SinkError> {
        let record = FutureRecord::<(), [u8]>::to(&self.topic)
            .payload(payload)
            .timestamp(chrono::Utc::now().timestamp_millis());

        self.producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map(|_| ())
            .map_err(|(e, _)| SinkError::Kafka(e.to_string()))
    }
}
