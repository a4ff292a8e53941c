use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::LedgerError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::LedgerError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::LedgerError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::LedgerError::RusqliteError)?;
    Ok(conn)
}

pub fn ledger_db_path(root: &Path) -> PathBuf {
    root.join(schemas::LEDGER_DB_NAME)
}

pub fn ensure_schema(conn: &Connection) -> Result<(), error::LedgerError> {
    for ddl in schemas::LEDGER_DB_SCHEMA {
        conn.execute(ddl, [])?;
    }
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES('schema_version', ?1)",
        params![schemas::LEDGER_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

pub fn initialize_ledger_db(root: &Path, actor: &str) -> Result<PathBuf, error::LedgerError> {
    fs::create_dir_all(root).map_err(error::LedgerError::IoError)?;
    let db_path = ledger_db_path(root);

    let broker = DbBroker::new(root);
    broker.with_conn(&db_path, actor, None, "ledger.init", |conn| {
        ensure_schema(conn)?;
        Ok(())
    })?;
    Ok(db_path)
}

pub fn schema_version(conn: &Connection) -> Result<Option<u32>, error::LedgerError> {
    use rusqlite::OptionalExtension;
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.and_then(|v| v.parse().ok()))
}
