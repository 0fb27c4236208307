//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Publish sink used by the journey simulator: a [`Transport`] contract, JSON
//! encoding of outbound records, and a [`Publisher`] that awaits every delivery
//! outcome and reports it.

pub mod codec;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod logging;
pub mod publisher;
pub mod transport;

/// Shared result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;

/// Errors raised while encoding or delivering records.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// The broker (or sink) rejected or lost the record.
    #[error("delivery to topic '{topic}' failed: {reason}")]
    Delivery {
        /// Topic the record was addressed to.
        topic: String,
        /// Broker supplied failure detail.
        reason: String,
    },
    /// The record could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Wrapper for IO errors raised by stream based sinks.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The transport could not be constructed from the supplied settings.
    #[error("transport configuration error: {0}")]
    Config(String),
    /// Delivery metrics could not be created or registered.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl MessagingError {
    /// Build a delivery failure for `topic`.
    pub fn delivery(topic: impl Into<String>, reason: impl ToString) -> Self {
        Self::Delivery {
            topic: topic.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that only affect a single record.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }
}

pub use codec::{decode_json, encode_json, Keyed};
#[cfg(feature = "kafka")]
pub use kafka::KafkaTransport;
pub use logging::{log_delivery, MessagingMetricsExporter};
pub use publisher::{DeliveryEvent, PublishMetrics, Publisher};
pub use transport::{
    DeliveryOutcome, DeliveryReport, InMemoryTransport, PublishedMessage, StdoutTransport,
    Transport,
};
