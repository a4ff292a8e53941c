//! Registries and the unit of work that scopes every handler.
//!
//! A backend hands each transaction handler one [`UnitOfWork`]. All registry
//! writes and emitted events made through it either commit together or not at
//! all. [`Registry`] is the typed view handlers use on top of it.

use crate::core::error::LedgerError;
use crate::core::events::{Event, EventEnvelope};
use crate::core::resource::RecordKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::marker::PhantomData;

/// A document stored in exactly one registry, keyed by its identifier.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
    fn identifier(&self) -> &str;
}

/// Read access to registry contents.
pub trait RecordReader {
    fn fetch(&self, kind: RecordKind, id: &str) -> Result<Option<JsonValue>, LedgerError>;
    /// All records of `kind`, ordered by identifier.
    fn scan(&self, kind: RecordKind) -> Result<Vec<JsonValue>, LedgerError>;
    /// Number of records of `kind`, without loading them.
    fn count(&self, kind: RecordKind) -> Result<u64, LedgerError>;
}

/// Writes staged by one transaction.
pub trait UnitOfWork: RecordReader {
    fn transaction_id(&self) -> &str;
    /// Fails with `DuplicateIdentifier` when `(kind, id)` exists.
    fn insert(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError>;
    /// Fails with `NotFound` when `(kind, id)` is absent.
    fn replace(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError>;
    fn emit_envelope(&mut self, envelope: EventEnvelope) -> Result<(), LedgerError>;
    fn emitted(&self) -> &[EventEnvelope];
}

/// Result of a committed unit of work.
#[derive(Debug)]
pub struct Committed<R> {
    pub value: R,
    pub events: Vec<EventEnvelope>,
}

/// Storage that can run a closure as one atomic unit of work.
pub trait LedgerBackend {
    fn transact<R, F>(
        &mut self,
        transaction_id: &str,
        op: &str,
        f: F,
    ) -> Result<Committed<R>, LedgerError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<R, LedgerError>;

    fn inspect<R, F>(&self, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&dyn RecordReader) -> Result<R, LedgerError>;
}

pub fn emit<E: Event>(uow: &mut dyn UnitOfWork, event: &E) -> Result<String, LedgerError> {
    let payload = serde_json::to_value(event)?;
    let envelope = EventEnvelope::new(uow.transaction_id(), E::EVENT_TYPE, payload);
    let event_id = envelope.event_id.clone();
    uow.emit_envelope(envelope)?;
    Ok(event_id)
}

pub fn load<T: Record, R: RecordReader + ?Sized>(reader: &R, id: &str) -> Result<T, LedgerError> {
    match reader.fetch(T::KIND, id)? {
        Some(body) => Ok(serde_json::from_value(body)?),
        None => Err(LedgerError::not_found(T::KIND, id)),
    }
}

pub fn load_all<T: Record, R: RecordReader + ?Sized>(reader: &R) -> Result<Vec<T>, LedgerError> {
    let mut out = Vec::new();
    for body in reader.scan(T::KIND)? {
        out.push(serde_json::from_value(body)?);
    }
    Ok(out)
}

pub fn registry<T: Record>(uow: &mut dyn UnitOfWork) -> Registry<'_, T> {
    Registry {
        uow,
        _record: PhantomData,
    }
}

/// Typed registry over one unit of work.
pub struct Registry<'a, T: Record> {
    uow: &'a mut dyn UnitOfWork,
    _record: PhantomData<T>,
}

impl<T: Record> Registry<'_, T> {
    pub fn add(&mut self, record: &T) -> Result<(), LedgerError> {
        let body = serde_json::to_value(record)?;
        self.uow.insert(T::KIND, record.identifier(), body)
    }

    /// Bulk add. Nothing is staged if any identifier collides, including
    /// collisions inside `records` itself.
    pub fn add_all(&mut self, records: &[T]) -> Result<(), LedgerError> {
        let mut seen = HashSet::new();
        for record in records {
            let id = record.identifier();
            if !seen.insert(id) || self.exists(id)? {
                return Err(LedgerError::duplicate(T::KIND, id));
            }
        }
        for record in records {
            self.add(record)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<T, LedgerError> {
        load(&*self.uow, id)
    }

    pub fn exists(&self, id: &str) -> Result<bool, LedgerError> {
        Ok(self.uow.fetch(T::KIND, id)?.is_some())
    }

    pub fn update(&mut self, record: &T) -> Result<(), LedgerError> {
        let body = serde_json::to_value(record)?;
        self.uow.replace(T::KIND, record.identifier(), body)
    }
}
