//! SQLite ledger backend.
//!
//! Every unit of work is one SQLite transaction opened through the broker, so
//! it is serialized in-process and audited. Records and events commit together.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::LedgerError;
use crate::core::events::EventEnvelope;
use crate::core::registry::{Committed, LedgerBackend, RecordReader, UnitOfWork};
use crate::core::resource::RecordKind;
use crate::core::store::Store;
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

pub struct SqliteBackend {
    db_path: PathBuf,
    actor: String,
    broker: DbBroker,
}

impl SqliteBackend {
    /// Open (and create if needed) the ledger database in `store`.
    pub fn open(store: &Store, actor: &str) -> Result<Self, LedgerError> {
        let db_path = db::initialize_ledger_db(&store.root, actor)?;
        Ok(Self {
            db_path,
            actor: actor.to_string(),
            broker: DbBroker::new(&store.root),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Committed events, optionally restricted to one transaction.
    pub fn committed_events(
        &self,
        transaction_id: Option<&str>,
    ) -> Result<Vec<EventEnvelope>, LedgerError> {
        self.broker
            .with_conn(&self.db_path, &self.actor, transaction_id, "ledger.events", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT event_id, ts, transaction_id, event_type, payload FROM ledger_events
                     WHERE (?1 IS NULL OR transaction_id = ?1)
                     ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![transaction_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?;

                let mut out = Vec::new();
                for r in rows {
                    let (event_id, ts, transaction_id, event_type, payload) = r?;
                    out.push(EventEnvelope {
                        event_id,
                        ts,
                        transaction_id,
                        event_type,
                        payload: serde_json::from_str(&payload)?,
                    });
                }
                Ok(out)
            })
    }
}

struct SqliteUnitOfWork<'c> {
    conn: &'c Connection,
    transaction_id: String,
    events: Vec<EventEnvelope>,
}

impl RecordReader for SqliteUnitOfWork<'_> {
    fn fetch(&self, kind: RecordKind, id: &str) -> Result<Option<JsonValue>, LedgerError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn scan(&self, kind: RecordKind) -> Result<Vec<JsonValue>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM records WHERE kind = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![kind.as_str()], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(serde_json::from_str(&r?)?);
        }
        Ok(out)
    }

    fn count(&self, kind: RecordKind) -> Result<u64, LedgerError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    fn insert(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError> {
        if self.fetch(kind, id)?.is_some() {
            return Err(LedgerError::duplicate(kind, id));
        }
        let now = time::now_epoch_z();
        self.conn.execute(
            "INSERT INTO records(kind, id, body, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![kind.as_str(), id, serde_json::to_string(&body)?, now, now],
        )?;
        Ok(())
    }

    fn replace(&mut self, kind: RecordKind, id: &str, body: JsonValue) -> Result<(), LedgerError> {
        let changed = self.conn.execute(
            "UPDATE records SET body = ?3, updated_at = ?4 WHERE kind = ?1 AND id = ?2",
            params![
                kind.as_str(),
                id,
                serde_json::to_string(&body)?,
                time::now_epoch_z()
            ],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found(kind, id));
        }
        Ok(())
    }

    fn emit_envelope(&mut self, envelope: EventEnvelope) -> Result<(), LedgerError> {
        self.conn.execute(
            "INSERT INTO ledger_events(event_id, ts, event_type, transaction_id, payload)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![
                envelope.event_id,
                envelope.ts,
                envelope.event_type,
                envelope.transaction_id,
                serde_json::to_string(&envelope.payload)?
            ],
        )?;
        self.events.push(envelope);
        Ok(())
    }

    fn emitted(&self) -> &[EventEnvelope] {
        &self.events
    }
}

impl LedgerBackend for SqliteBackend {
    fn transact<R, F>(
        &mut self,
        transaction_id: &str,
        op: &str,
        f: F,
    ) -> Result<Committed<R>, LedgerError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<R, LedgerError>,
    {
        self.broker
            .with_conn(&self.db_path, &self.actor, Some(transaction_id), op, |conn| {
                // IMMEDIATE: the write lock is held before the first read.
                // Dropping `tx` without commit rolls back.
                let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
                let mut uow = SqliteUnitOfWork {
                    conn: &tx,
                    transaction_id: transaction_id.to_string(),
                    events: Vec::new(),
                };
                let value = f(&mut uow)?;
                let events = uow.events;
                tx.commit()?;
                Ok(Committed { value, events })
            })
    }

    fn inspect<R, F>(&self, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&dyn RecordReader) -> Result<R, LedgerError>,
    {
        self.broker
            .with_conn(&self.db_path, &self.actor, None, "ledger.inspect", |conn| {
                let uow = SqliteUnitOfWork {
                    conn,
                    transaction_id: String::new(),
                    events: Vec::new(),
                };
                f(&uow)
            })
    }
}
