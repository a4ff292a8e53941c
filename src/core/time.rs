//! Identifiers and timestamps.
//!
//! Every identifier is a ULID. A [`Stamp`] pairs a fresh ULID with a
//! timestamp taken from the ULID itself, so a transaction's id and its
//! recorded time can never disagree.

use serde_json::Value as JsonValue;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub id: String,
    /// Unix epoch with millisecond fraction and `Z` suffix, e.g. `1771220592.041Z`.
    pub ts: String,
}

pub fn stamp() -> Stamp {
    let ulid = Ulid::new();
    Stamp {
        id: ulid.to_string(),
        ts: epoch_millis_z(ulid.timestamp_ms()),
    }
}

pub fn epoch_millis_z(ms: u64) -> String {
    format!("{}.{:03}Z", ms / 1000, ms % 1000)
}

pub fn now_epoch_z() -> String {
    stamp().ts
}

/// JSON-mode response line: `{cmd, status, ts, ...body}`. Non-object bodies
/// land under `data`.
pub fn response_envelope(cmd: &str, status: &str, body: JsonValue) -> JsonValue {
    let mut envelope = serde_json::Map::new();
    envelope.insert("cmd".into(), cmd.into());
    envelope.insert("status".into(), status.into());
    envelope.insert("ts".into(), now_epoch_z().into());
    match body {
        JsonValue::Object(fields) => envelope.extend(fields),
        JsonValue::Null => {}
        other => {
            envelope.insert("data".into(), other);
        }
    }
    JsonValue::Object(envelope)
}
