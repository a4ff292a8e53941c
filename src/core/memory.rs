//! In-memory ledger backend.
//!
//! Each unit of work stages a copy of the registries and swaps it in on
//! commit; a failed handler drops the copy.

use crate::core::error::LedgerError;
use crate::core::events::EventEnvelope;
use crate::core::registry::{Committed, LedgerBackend, RecordReader, UnitOfWork};
use crate::core::resource::RecordKind;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

type Records = BTreeMap<RecordKind, BTreeMap<String, JsonValue>>;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Records,
    events: Vec<EventEnvelope>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event committed so far, in commit order.
    pub fn committed_events(&self) -> &[EventEnvelope] {
        &self.events
    }

    pub fn record_count(&self, kind: RecordKind) -> usize {
        self.records.get(&kind).map(|m| m.len()).unwrap_or(0)
    }
}

struct MemoryView<'a> {
    records: &'a Records,
}

impl RecordReader for MemoryView<'_> {
    fn fetch(&self, kind: RecordKind, id: &str) -> Result<Option<JsonValue>, LedgerError> {
        Ok(self.records.get(&kind).and_then(|m| m.get(id)).cloned())
    }

    fn scan(&self, kind: RecordKind) -> Result<Vec<JsonValue>, LedgerError> {
        Ok(self
            .records
            .get(&kind)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    fn count(&self, kind: RecordKind) -> Result<u64, LedgerError> {
        Ok(self.records.get(&kind).map_or(0, |m| m.len() as u64))
    }
}

struct MemoryUnitOfWork {
    transaction_id: String,
    staged: Records,
    events: Vec<EventEnvelope>,
}

impl RecordReader for MemoryUnitOfWork {
    fn fetch(&self, kind: RecordKind, id: &str) -> Result<Option<JsonValue>, LedgerError> {
        MemoryView {
            records: &self.staged,
        }
        .fetch(kind, id)
    }

    fn scan(&self, kind: RecordKind) -> Result<Vec<JsonValue>, LedgerError> {
        MemoryView {
            records: &self.staged,
        }
        .scan(kind)
    }

    fn count(&self, kind: RecordKind) -> Result<u64, LedgerError> {
        MemoryView {
            records: &self.staged,
        }
        .count(kind)
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    fn insert(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError> {
        let registry = self.staged.entry(kind).or_default();
        if registry.contains_key(id) {
            return Err(LedgerError::duplicate(kind, id));
        }
        registry.insert(id.to_string(), body);
        Ok(())
    }

    fn replace(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError> {
        match self.staged.get_mut(&kind).and_then(|m| m.get_mut(id)) {
            Some(slot) => {
                *slot = body;
                Ok(())
            }
            None => Err(LedgerError::not_found(kind, id)),
        }
    }

    fn emit_envelope(&mut self, envelope: EventEnvelope) -> Result<(), LedgerError> {
        self.events.push(envelope);
        Ok(())
    }

    fn emitted(&self) -> &[EventEnvelope] {
        &self.events
    }
}

impl LedgerBackend for MemoryBackend {
    fn transact<R, F>(
        &mut self,
        transaction_id: &str,
        _op: &str,
        f: F,
    ) -> Result<Committed<R>, LedgerError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<R, LedgerError>,
    {
        let mut uow = MemoryUnitOfWork {
            transaction_id: transaction_id.to_string(),
            staged: self.records.clone(),
            events: Vec::new(),
        };
        let value = f(&mut uow)?;

        self.records = uow.staged;
        self.events.extend(uow.events.iter().cloned());
        Ok(Committed {
            value,
            events: uow.events,
        })
    }

    fn inspect<R, F>(&self, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&dyn RecordReader) -> Result<R, LedgerError>,
    {
        f(&MemoryView {
            records: &self.records,
        })
    }
}
