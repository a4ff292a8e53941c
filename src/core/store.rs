//! Store abstraction for the ledger's on-disk state.
//!
//! A store is a directory holding the registry database, the broker audit
//! log, the emitted-event log, and the optional `ledger.toml`.

use crate::core::error;
use std::path::{Path, PathBuf};

pub const STORE_DIR_NAME: &str = ".container-network";
pub const HOME_ENV_VAR: &str = "CONTAINER_NETWORK_HOME";

/// Which store a command targets.
///
/// - `User`: `~/.container-network/`, one ledger per user
/// - `Project`: `<cwd>/.container-network/`, one ledger per working tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    User,
    Project,
}

/// Store handle representing one ledger workspace.
#[derive(Debug, Clone)]
pub struct Store {
    pub kind: StoreKind,
    /// Absolute path to the store root directory
    pub root: PathBuf,
}

impl Store {
    pub fn new(kind: StoreKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    /// Resolve the store root: explicit directory, then `CONTAINER_NETWORK_HOME`,
    /// then the default location for `kind`.
    pub fn resolve(
        kind: StoreKind,
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<Self, error::LedgerError> {
        if let Some(dir) = explicit {
            return Ok(Self::new(kind, dir));
        }
        if let Ok(home) = std::env::var(HOME_ENV_VAR) {
            if !home.trim().is_empty() {
                return Ok(Self::new(kind, home));
            }
        }
        let root = match kind {
            StoreKind::Project => cwd.join(STORE_DIR_NAME),
            StoreKind::User => {
                let home = std::env::var("HOME").map_err(|_| {
                    error::LedgerError::ConfigError(
                        "HOME is not set; pass --data-dir or use the project store".to_string(),
                    )
                })?;
                PathBuf::from(home).join(STORE_DIR_NAME)
            }
        };
        Ok(Self::new(kind, root))
    }

    pub fn ledger_db_path(&self) -> PathBuf {
        self.root.join(crate::core::schemas::LEDGER_DB_NAME)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.root.join(crate::core::schemas::AUDIT_LOG_NAME)
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.root.join(crate::core::schemas::EVENT_LOG_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(crate::core::config::CONFIG_FILE_NAME)
    }
}
