//! ---
//! vtel_section: "02-messaging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Publish sink contract, codecs and broker transports."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
//! JSON wire encoding for outbound records.
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// Records that carry their own message key.
pub trait Keyed {
    /// Key used for partitioning, normally the record's identifier.
    fn message_key(&self) -> String;
}

/// Encode a record as a compact JSON object.
pub fn encode_json<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_vec(value)?)
}

/// Decode a JSON payload produced by [`encode_json`].
pub fn decode_json<T>(payload: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_slice(payload)?)
}
