use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Missing field: value for {field} was expected")]
    MissingField { field: String },
    #[error("Not found: {kind} '{id}' does not exist")]
    NotFound { kind: String, id: String },
    #[error("Duplicate identifier: {kind} '{id}' already exists")]
    DuplicateIdentifier { kind: String, id: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn missing_field(field: &str) -> Self {
        LedgerError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn not_found(kind: impl ToString, id: &str) -> Self {
        LedgerError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(kind: impl ToString, id: &str) -> Self {
        LedgerError::DuplicateIdentifier {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Stable rejection code surfaced to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::MissingField { .. } => "MISSING_FIELD",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
            LedgerError::ValidationError(_) => "VALIDATION",
            LedgerError::ConfigError(_) => "CONFIG",
            LedgerError::RusqliteError(_) => "STORAGE",
            LedgerError::IoError(_) => "IO",
            LedgerError::SerdeError(_) => "SERDE",
        }
    }
}
