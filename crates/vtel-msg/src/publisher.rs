//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::logging::{log_delivery, MessagingMetricsExporter};
use crate::transport::{DeliveryOutcome, Transport};
use crate::{encode_json, Keyed, Result};

/// Snapshot of publish counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishMetrics {
    /// Records acknowledged by the transport.
    pub delivered: u64,
    /// Records the transport failed to deliver.
    pub failed: u64,
}

/// Delivery details handed to `on_delivery` hooks.
#[derive(Debug)]
pub struct DeliveryEvent<'a> {
    /// Topic the record was published to.
    pub topic: &'a str,
    /// Message key.
    pub key: &'a str,
    /// Delivery outcome reported by the transport.
    pub outcome: &'a DeliveryOutcome,
    /// Time spent waiting for the outcome.
    pub latency: Duration,
}

type DeliveryHook = Box<dyn Fn(&DeliveryEvent<'_>) + Send + Sync>;

/// Encodes records, hands them to a transport and reports every outcome.
///
/// Delivery failures are logged and counted but never returned as errors;
/// only encoding problems abort the caller.
pub struct Publisher {
    transport: Arc<dyn Transport>,
    hooks: Vec<DeliveryHook>,
    metrics: MessagingMetricsExporter,
}

impl Publisher {
    /// Wrap a transport, counting outcomes in metrics private to this publisher.
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::with_metrics(transport, MessagingMetricsExporter::new()?))
    }

    /// Wrap a transport, counting outcomes in `metrics`, e.g. handles
    /// registered with a shared Prometheus registry.
    pub fn with_metrics(transport: Arc<dyn Transport>, metrics: MessagingMetricsExporter) -> Self {
        Self {
            transport,
            hooks: Vec::new(),
            metrics,
        }
    }

    /// Register a callback invoked after each delivery outcome is known.
    pub fn on_delivery<F>(&mut self, hook: F)
    where
        F: Fn(&DeliveryEvent<'_>) + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Name of the wrapped transport.
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Encode `record` as JSON, publish it keyed by its id and await the outcome.
    ///
    /// Returns `Err` only when the record cannot be encoded; the delivery outcome
    /// itself is returned in the `Ok` variant after it has been reported.
    pub async fn publish<R>(&self, topic: &str, record: &R) -> Result<DeliveryOutcome>
    where
        R: Serialize + Keyed + ?Sized,
    {
        let payload = encode_json(record)?;
        let key = record.message_key();
        Ok(self.publish_raw(topic, &key, &payload).await)
    }

    /// Publish an already encoded payload and report the outcome.
    pub async fn publish_raw(&self, topic: &str, key: &str, payload: &[u8]) -> DeliveryOutcome {
        let started = Instant::now();
        let outcome = self.transport.publish(topic, key, payload).await;
        let latency = started.elapsed();

        log_delivery(topic, key, self.transport.name(), &outcome);
        self.metrics.observe(&outcome, latency);

        let event = DeliveryEvent {
            topic,
            key,
            outcome: &outcome,
            latency,
        };
        for hook in &self.hooks {
            hook(&event);
        }
        outcome
    }

    /// Flush the underlying transport, e.g. on shutdown.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.transport.flush(timeout)
    }

    /// Return the current counters.
    pub fn metrics(&self) -> PublishMetrics {
        PublishMetrics {
            delivered: self.metrics.delivered(),
            failed: self.metrics.failed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Serialize;

    use super::*;
    use crate::transport::InMemoryTransport;
    use crate::MessagingError;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Reading {
        id: String,
        speed_kmh: f64,
    }

    impl Keyed for Reading {
        fn message_key(&self) -> String {
            self.id.clone()
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(<S::Error as serde::ser::Error>::custom("sensor value not representable"))
        }
    }

    impl Keyed for Unencodable {
        fn message_key(&self) -> String {
            "unencodable".into()
        }
    }

    fn publisher_with_in_memory() -> (Publisher, InMemoryTransport) {
        let transport = InMemoryTransport::new();
        let publisher = Publisher::new(Arc::new(transport.clone())).expect("publisher");
        (publisher, transport)
    }

    #[tokio::test]
    async fn publish_uses_record_id_as_key() {
        let (publisher, transport) = publisher_with_in_memory();
        let reading = Reading {
            id: "9a1f".into(),
            speed_kmh: 55.0,
        };
        let outcome = publisher
            .publish("vehicle_data", &reading)
            .await
            .expect("encodable");
        assert!(outcome.is_ok());

        let message = transport.recv().expect("captured");
        assert_eq!(message.key, "9a1f");
        let json = message.json().expect("json payload");
        assert_eq!(json["speedKmh"], 55.0);
        assert_eq!(
            publisher.metrics(),
            PublishMetrics {
                delivered: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn delivery_failures_are_counted_not_raised() {
        let (mut publisher, transport) = publisher_with_in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        publisher.on_delivery(move |event| {
            sink.lock()
                .expect("hook lock")
                .push((event.topic.to_owned(), event.outcome.is_ok()));
        });
        transport.fail_topic("weather_data");

        let reading = Reading {
            id: "r1".into(),
            speed_kmh: 1.0,
        };
        let failed = publisher
            .publish("weather_data", &reading)
            .await
            .expect("encoding still succeeds");
        assert!(matches!(failed, Err(MessagingError::Delivery { .. })));
        publisher
            .publish("gps_data", &reading)
            .await
            .expect("encodable")
            .expect("delivered");

        assert_eq!(
            publisher.metrics(),
            PublishMetrics {
                delivered: 1,
                failed: 1
            }
        );
        let seen = seen.lock().expect("hook lock");
        assert_eq!(
            *seen,
            vec![("weather_data".to_owned(), false), ("gps_data".to_owned(), true)]
        );
    }

    #[tokio::test]
    async fn exporter_receives_outcomes() {
        let registry = prometheus::Registry::new();
        let exporter = MessagingMetricsExporter::register(&registry).expect("register");
        let transport = InMemoryTransport::new();
        let publisher = Publisher::with_metrics(Arc::new(transport.clone()), exporter.clone());

        publisher.publish_raw("gps_data", "k", b"{}").await.expect("delivered");
        transport.fail_topic("gps_data");
        assert!(publisher.publish_raw("gps_data", "k", b"{}").await.is_err());

        assert_eq!(exporter.delivered(), 1);
        assert_eq!(exporter.failed(), 1);
        assert_eq!(publisher.transport_name(), "in_memory");
    }

    #[tokio::test]
    async fn encoding_failure_is_returned_before_anything_is_sent() {
        let (mut publisher, transport) = publisher_with_in_memory();
        let hook_calls = Arc::new(Mutex::new(0));
        let sink = hook_calls.clone();
        publisher.on_delivery(move |_| *sink.lock().expect("hook lock") += 1);

        let err = publisher
            .publish("vehicle_data", &Unencodable)
            .await
            .expect_err("record cannot be encoded");

        assert!(matches!(err, MessagingError::Serialization(_)));
        assert!(transport.is_empty());
        assert_eq!(*hook_calls.lock().expect("hook lock"), 0);
        assert_eq!(publisher.metrics(), PublishMetrics::default());
    }
}
