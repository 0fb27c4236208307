//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "tests"
//! vtel_type: "source"
//! vtel_scope: "test"
//! vtel_description: "End-to-end publish path through the in-memory and stdout sinks."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vtel_msg::{InMemoryTransport, Keyed, PublishMetrics, Publisher, StdoutTransport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpsReading {
    id: Uuid,
    device_id: String,
    speed: f64,
    direction: String,
}

impl Keyed for GpsReading {
    fn message_key(&self) -> String {
        self.id.to_string()
    }
}

fn reading(n: u128) -> GpsReading {
    GpsReading {
        id: Uuid::from_u128(n),
        device_id: "Smart-Vehicle".into(),
        speed: 42.0,
        direction: "North-East".into(),
    }
}

#[tokio::test]
async fn records_round_trip_through_in_memory_sink() -> anyhow::Result<()> {
    let transport = InMemoryTransport::new();
    let publisher = Publisher::new(Arc::new(transport.clone()))?;

    for n in 1..=3 {
        publisher.publish("gps_data", &reading(n)).await??;
    }

    let captured = transport.drain();
    assert_eq!(captured.len(), 3);
    for (n, message) in (1..=3).zip(&captured) {
        let decoded: GpsReading = message.decode()?;
        assert_eq!(decoded, reading(n));
        assert_eq!(message.key, Uuid::from_u128(n).to_string());
        assert_eq!(message.json()?["id"], Uuid::from_u128(n).to_string());
    }
    Ok(())
}

#[tokio::test]
async fn failures_do_not_block_later_records() -> anyhow::Result<()> {
    let transport = InMemoryTransport::new();
    let mut publisher = Publisher::new(Arc::new(transport.clone()))?;
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let counter = hook_calls.clone();
    publisher.on_delivery(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    transport.fail_topic("gps_data");
    let outcome = publisher.publish("gps_data", &reading(1)).await?;
    assert!(outcome.is_err());
    transport.restore_topic("gps_data");
    publisher.publish("gps_data", &reading(2)).await??;

    assert_eq!(
        publisher.metrics(),
        PublishMetrics {
            delivered: 1,
            failed: 1
        }
    );
    assert_eq!(hook_calls.load(Ordering::Relaxed), 2);
    assert_eq!(transport.len(), 1);
    Ok(())
}

#[tokio::test]
async fn stdout_sink_writes_to_file() -> anyhow::Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let publisher = Publisher::new(Arc::new(StdoutTransport::with_writer(file.reopen()?)))?;

    publisher.publish("gps_data", &reading(7)).await??;
    publisher.flush(std::time::Duration::from_secs(1))?;

    let contents = std::fs::read_to_string(file.path())?;
    let mut fields = contents.trim_end().splitn(3, '\t');
    assert_eq!(fields.next(), Some("gps_data"));
    assert_eq!(fields.next(), Some(Uuid::from_u128(7).to_string().as_str()));
    let payload: GpsReading = serde_json::from_str(fields.next().unwrap_or_default())?;
    assert_eq!(payload, reading(7));
    Ok(())
}
