//! Ledger configuration loaded from `<store>/ledger.toml`.

use crate::core::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "ledger.toml";
pub const DEFAULT_NAMESPACE: &str = "org.acme.container_network";
pub const DEFAULT_ACTOR: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Namespace for fully-qualified types and relationship URIs.
    pub namespace: String,
    /// Identity recorded in audit lines and historian records.
    pub actor: String,
    /// Require referenced Producers/Transporters to exist in their registry.
    pub strict_relationships: bool,
    /// Append committed events to `ledger.events.jsonl`.
    pub event_log: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            actor: DEFAULT_ACTOR.to_string(),
            strict_relationships: false,
            event_log: true,
        }
    }
}

impl LedgerConfig {
    pub fn parse(content: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            toml::from_str(content).map_err(|e| LedgerError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `root/ledger.toml`. No file means defaults (not an error).
    pub fn load(root: &Path) -> Result<Self, LedgerError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(LedgerError::IoError)?;
        Self::parse(&content).map_err(|e| match e {
            LedgerError::ConfigError(msg) => {
                LedgerError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Write the defaults unless a config already exists. Returns true if written.
    pub fn write_default(root: &Path) -> Result<bool, LedgerError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(root).map_err(LedgerError::IoError)?;
        let body = toml::to_string(&Self::default())
            .map_err(|e| LedgerError::ConfigError(e.to_string()))?;
        fs::write(&path, body).map_err(LedgerError::IoError)?;
        Ok(true)
    }

    fn validate(&self) -> Result<(), LedgerError> {
        let segment_ok = |seg: &str| {
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !self.namespace.split('.').all(segment_ok) {
            return Err(LedgerError::ConfigError(format!(
                "invalid namespace '{}': expected dot-separated [A-Za-z0-9_] segments",
                self.namespace
            )));
        }
        if self.actor.trim().is_empty() {
            return Err(LedgerError::ConfigError("actor cannot be empty".to_string()));
        }
        Ok(())
    }
}
