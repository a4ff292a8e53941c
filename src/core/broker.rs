//! Serialized, audited access to the ledger database.
//!
//! All connections go through [`DbBroker::with_conn`]. Operations are
//! serialized in-process and each one appends an [`AuditEntry`] to
//! `broker.events.jsonl` in the store, whether it succeeded or not.

use crate::core::db;
use crate::core::error::LedgerError;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

static LEDGER_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Error,
    /// A post-commit event sink failed; the transaction itself committed.
    SinkError,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Error => "error",
            AuditStatus::SinkError => "sink_error",
        }
    }
}

/// One line of the audit log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub ts: String,
    pub entry_id: String,
    pub actor: String,
    /// Transaction this operation belongs to, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub op: String,
    pub target: String,
    pub status: AuditStatus,
    /// Rejection code of the failing operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

pub struct DbBroker {
    audit_log_path: PathBuf,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(schemas::AUDIT_LOG_NAME),
        }
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Run `f` on a fresh connection to `db_path` while holding the ledger lock.
    ///
    /// The result of `f` is returned as is. An audit line that cannot be
    /// written is reported on stderr and never turns a committed operation
    /// into an error.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        transaction_id: Option<&str>,
        op: &str,
        f: F,
    ) -> Result<R, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<R, LedgerError>,
    {
        let _guard = LEDGER_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let started = Instant::now();

        let result = db::db_connect(&db_path.to_string_lossy()).and_then(|conn| f(&conn));

        let (status, code) = match &result {
            Ok(_) => (AuditStatus::Success, None),
            Err(e) => (AuditStatus::Error, Some(e.kind())),
        };
        let target = db_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let appended = self.append(AuditEntry {
            ts: String::new(),
            entry_id: String::new(),
            actor: actor.to_string(),
            transaction_id: transaction_id.map(str::to_string),
            op: op.to_string(),
            target,
            status,
            code: code.map(str::to_string),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        if let Err(e) = appended {
            eprintln!(
                "warning: audit line for {} ({}) not written to {}: {}",
                op,
                status.as_str(),
                self.audit_log_path.display(),
                e
            );
        }

        result
    }

    /// Record an operation that did not go through [`DbBroker::with_conn`].
    pub fn record(
        &self,
        actor: &str,
        transaction_id: Option<&str>,
        op: &str,
        target: &str,
        status: AuditStatus,
    ) -> Result<(), LedgerError> {
        self.append(AuditEntry {
            ts: String::new(),
            entry_id: String::new(),
            actor: actor.to_string(),
            transaction_id: transaction_id.map(str::to_string),
            op: op.to_string(),
            target: target.to_string(),
            status,
            code: None,
            elapsed_ms: 0,
        })
    }

    fn append(&self, mut entry: AuditEntry) -> Result<(), LedgerError> {
        let stamp = time::stamp();
        entry.ts = stamp.ts;
        entry.entry_id = stamp.id;

        if let Some(parent) = self.audit_log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        Ok(())
    }

    pub fn read_audit_log(&self) -> Result<Vec<AuditEntry>, LedgerError> {
        if !self.audit_log_path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(&self.audit_log_path)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(LedgerError::from))
            .collect()
    }
}
