//! Database schema definitions and store file names.
//!
//! The ledger keeps a single SQLite database:
//! - `records`: every asset, participant, and historian record, keyed by (kind, id)
//! - `ledger_events`: committed events, written in the same transaction as the records

pub const LEDGER_DB_NAME: &str = "ledger.db";
pub const AUDIT_LOG_NAME: &str = "broker.events.jsonl";
pub const EVENT_LOG_NAME: &str = "ledger.events.jsonl";
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

pub const LEDGER_DB_SCHEMA_META: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";

pub const LEDGER_DB_SCHEMA_RECORDS: &str = "
    CREATE TABLE IF NOT EXISTS records (
        kind TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL, -- JSON document
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY(kind, id)
    )
";

pub const LEDGER_DB_SCHEMA_EVENTS: &str = "
    CREATE TABLE IF NOT EXISTS ledger_events (
        event_id TEXT PRIMARY KEY,
        ts TEXT NOT NULL,
        event_type TEXT NOT NULL,
        transaction_id TEXT NOT NULL,
        payload TEXT NOT NULL
    )
";

pub const LEDGER_DB_INDEX_RECORDS_KIND: &str =
    "CREATE INDEX IF NOT EXISTS idx_records_kind ON records(kind)";
pub const LEDGER_DB_INDEX_EVENTS_TX: &str =
    "CREATE INDEX IF NOT EXISTS idx_ledger_events_tx ON ledger_events(transaction_id)";

pub const LEDGER_DB_SCHEMA: &[&str] = &[
    LEDGER_DB_SCHEMA_META,
    LEDGER_DB_SCHEMA_RECORDS,
    LEDGER_DB_SCHEMA_EVENTS,
    LEDGER_DB_INDEX_RECORDS_KIND,
    LEDGER_DB_INDEX_EVENTS_TX,
];
