//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
//! Kafka sink built on librdkafka's future producer.
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::client::ClientContext;
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{error, warn};

use crate::transport::{DeliveryReport, Transport};
use crate::{MessagingError, Result};

/// Client context forwarding librdkafka errors and logs to tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingClientContext;

impl ClientContext for TracingClientContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => error!(facility = fac, "{}", log_message),
            RDKafkaLogLevel::Warning => warn!(facility = fac, "{}", log_message),
            _ => tracing::debug!(facility = fac, "{}", log_message),
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!(error = %error, reason, "Kafka client error");
    }
}

/// Producer publishing to a Kafka cluster.
pub struct KafkaTransport {
    producer: FutureProducer<TracingClientContext>,
    queue_timeout: Duration,
}

impl KafkaTransport {
    /// Connect a producer to `bootstrap_servers`.
    ///
    /// `message_timeout` bounds how long librdkafka keeps retrying a record
    /// before reporting it as failed.
    pub fn new(
        bootstrap_servers: &str,
        client_id: Option<&str>,
        message_timeout: Duration,
    ) -> Result<Self> {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", message_timeout.as_millis().to_string());
        if let Some(client_id) = client_id {
            config.set("client.id", client_id);
        }
        let producer = config
            .create_with_context(TracingClientContext)
            .map_err(|err| MessagingError::Config(err.to_string()))?;
        Ok(Self {
            producer,
            queue_timeout: message_timeout,
        })
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryReport> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok((partition, offset)) => Ok(DeliveryReport {
                topic: topic.to_owned(),
                partition,
                offset,
            }),
            Err((err, _message)) => Err(MessagingError::delivery(topic, err)),
        }
    }

    fn name(&self) -> &'static str {
        "kafka"
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|err| MessagingError::delivery("*", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_is_created_without_contacting_brokers() {
        let transport = KafkaTransport::new("localhost:9092", Some("vtel-test"), Duration::from_secs(1))
            .expect("producer creation is lazy");
        assert_eq!(transport.name(), "kafka");
    }

    #[test]
    fn invalid_client_settings_are_config_errors() {
        // message.timeout.ms is capped at i32::MAX by librdkafka.
        let err = KafkaTransport::new("localhost:9092", None, Duration::from_secs(10_000_000))
            .err()
            .expect("oversized message timeout rejected");
        assert!(matches!(err, MessagingError::Config(_)));
    }
}
