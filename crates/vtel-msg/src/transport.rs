//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::{decode_json, MessagingError, Result};

/// Broker acknowledgement for a delivered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Topic the record landed on.
    pub topic: String,
    /// Partition assigned by the sink.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
}

/// Outcome of handing one record to a transport.
pub type DeliveryOutcome = std::result::Result<DeliveryReport, MessagingError>;

/// Publish sink abstraction implemented by every backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand `payload` to the sink under `key` and wait for the delivery outcome.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryReport>;

    /// Human-readable transport name for logging/metrics.
    fn name(&self) -> &'static str;

    /// Block until queued records are handed off, or `timeout` expires.
    fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// A record captured by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic.
    pub topic: String,
    /// Message key.
    pub key: String,
    /// Encoded payload.
    pub payload: Vec<u8>,
    /// Offset assigned within the topic.
    pub offset: i64,
}

impl PublishedMessage {
    /// Decode the payload back into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_json(&self.payload)
    }

    /// Decode the payload as untyped JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        decode_json(&self.payload)
    }
}

#[derive(Default)]
struct InMemoryState {
    queue: VecDeque<PublishedMessage>,
    offsets: HashMap<String, i64>,
    failing_topics: HashSet<String>,
}

/// In-memory sink backed by a mutex protected queue, used in tests and
/// single-process runs.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTransport {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent publish to `topic` with a delivery error.
    pub fn fail_topic(&self, topic: impl Into<String>) {
        self.state.lock().failing_topics.insert(topic.into());
    }

    /// Accept publishes to `topic` again.
    pub fn restore_topic(&self, topic: &str) {
        self.state.lock().failing_topics.remove(topic);
    }

    /// Pop the oldest captured record.
    pub fn recv(&self) -> Option<PublishedMessage> {
        self.state.lock().queue.pop_front()
    }

    /// Take every captured record, oldest first.
    pub fn drain(&self) -> Vec<PublishedMessage> {
        self.state.lock().queue.drain(..).collect()
    }

    /// Number of captured records not yet drained.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// True when nothing is waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryReport> {
        let mut state = self.state.lock();
        if state.failing_topics.contains(topic) {
            return Err(MessagingError::delivery(topic, "topic unavailable"));
        }
        let offset = {
            let next = state.offsets.entry(topic.to_owned()).or_insert(0);
            let current = *next;
            *next += 1;
            current
        };
        state.queue.push_back(PublishedMessage {
            topic: topic.to_owned(),
            key: key.to_owned(),
            payload: payload.to_vec(),
            offset,
        });
        Ok(DeliveryReport {
            topic: topic.to_owned(),
            partition: 0,
            offset,
        })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Dry-run sink writing one `topic<TAB>key<TAB>payload` line per record.
pub struct StdoutTransport {
    writer: Mutex<Box<dyn Write + Send>>,
    written: Mutex<HashMap<String, i64>>,
}

impl StdoutTransport {
    /// Write to the process stdout.
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Write to an arbitrary sink, e.g. a file or buffer.
    pub fn with_writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
            written: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdoutTransport {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryReport> {
        let body = std::str::from_utf8(payload)
            .map_err(|err| MessagingError::delivery(topic, format!("payload is not utf-8: {err}")))?;
        {
            let mut writer = self.writer.lock();
            writeln!(writer, "{topic}\t{key}\t{body}")?;
            writer.flush()?;
        }
        let mut written = self.written.lock();
        let next = written.entry(topic.to_owned()).or_insert(0);
        let offset = *next;
        *next += 1;
        Ok(DeliveryReport {
            topic: topic.to_owned(),
            partition: 0,
            offset,
        })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}
