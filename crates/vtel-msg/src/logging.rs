//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use vtel_logging::{vtel_error, vtel_info, LogContext};

use crate::transport::DeliveryOutcome;

/// Default delivery report: success with topic and partition, failure with detail.
pub fn log_delivery(topic: &str, key: &str, transport: &str, outcome: &DeliveryOutcome) {
    let ctx = LogContext::new().with_topic(topic).with_transport(transport);
    match outcome {
        Ok(report) => vtel_info!(
            context = ctx,
            "Message {} delivered to {} [{}] at offset {}",
            key,
            report.topic,
            report.partition,
            report.offset
        ),
        Err(err) => vtel_error!(context = ctx, "Message {} delivery failed: {}", key, err),
    }
}

/// Prometheus metric handles for delivery activity.
#[derive(Clone)]
pub struct MessagingMetricsExporter {
    delivered: IntCounter,
    failed: IntCounter,
    latency: Histogram,
}

impl MessagingMetricsExporter {
    /// Create metric handles that are not yet attached to any registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let delivered = IntCounter::with_opts(Opts::new(
            "messages_delivered_total",
            "Records acknowledged by the publish sink",
        ))?;
        let failed = IntCounter::with_opts(Opts::new(
            "messages_failed_total",
            "Records the publish sink failed to deliver",
        ))?;
        let latency = Histogram::with_opts(HistogramOpts::new(
            "message_delivery_latency_seconds",
            "Time between publish and delivery outcome",
        ))?;
        Ok(Self {
            delivered,
            failed,
            latency,
        })
    }

    /// Create delivery metrics and register them with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self::new()?;
        registry.register(Box::new(metrics.delivered.clone()))?;
        registry.register(Box::new(metrics.failed.clone()))?;
        registry.register(Box::new(metrics.latency.clone()))?;
        Ok(metrics)
    }

    /// Record one delivery outcome and how long it took.
    pub fn observe(&self, outcome: &DeliveryOutcome, latency: Duration) {
        match outcome {
            Ok(_) => self.delivered.inc(),
            Err(_) => self.failed.inc(),
        }
        self.latency.observe(latency.as_secs_f64());
    }

    /// Delivered record count.
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    /// Failed record count.
    pub fn failed(&self) -> u64 {
        self.failed.get()
    }
}
