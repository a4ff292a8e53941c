//! Event emission: envelopes, typed payloads, and post-commit sinks.
//!
//! Handlers emit into their unit of work. Events are only delivered to sinks
//! after the unit of work commits, so a rolled-back transaction emits nothing.

use crate::core::error::LedgerError;
use crate::core::time;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A typed event payload with a stable type name.
pub trait Event: Serialize + DeserializeOwned {
    const EVENT_TYPE: &'static str;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: String,
    pub ts: String,
    pub transaction_id: String,
    pub event_type: String,
    pub payload: JsonValue,
}

impl EventEnvelope {
    pub fn new(transaction_id: &str, event_type: &str, payload: JsonValue) -> Self {
        let stamp = time::stamp();
        Self {
            event_id: stamp.id,
            ts: stamp.ts,
            transaction_id: transaction_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        }
    }

    pub fn is<E: Event>(&self) -> bool {
        self.event_type == E::EVENT_TYPE
    }

    /// Decode the payload as `E`, failing if the envelope carries another type.
    pub fn decode<E: Event>(&self) -> Result<E, LedgerError> {
        if !self.is::<E>() {
            return Err(LedgerError::ValidationError(format!(
                "event {} is a {}, not a {}",
                self.event_id,
                self.event_type,
                E::EVENT_TYPE
            )));
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Receives committed events. Delivery is fire-and-forget from the ledger's
/// point of view: an error is recorded but never undoes the transaction.
pub trait EventSink: Send + Sync {
    fn name(&self) -> &str;
    fn deliver(&self, event: &EventEnvelope) -> Result<(), LedgerError>;
}

/// Appends one JSON line per event.
pub struct JsonlEventSink {
    path: PathBuf,
}

impl JsonlEventSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn deliver(&self, event: &EventEnvelope) -> Result<(), LedgerError> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(LedgerError::IoError)?;
        writeln!(f, "{}", serde_json::to_string(event)?).map_err(LedgerError::IoError)?;
        Ok(())
    }
}

pub fn read_event_log(path: &Path) -> Result<Vec<EventEnvelope>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(LedgerError::IoError)?;
    let mut out = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}

/// In-memory sink; clones share the same buffer.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn name(&self) -> &str {
        "collect"
    }

    fn deliver(&self, event: &EventEnvelope) -> Result<(), LedgerError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| LedgerError::ValidationError("collecting sink poisoned".to_string()))?;
        guard.push(event.clone());
        Ok(())
    }
}
