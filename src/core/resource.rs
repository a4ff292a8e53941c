//! Typed identities and weak references between ledger records.
//!
//! A [`Relationship`] names a record by kind and identifier. It is used for
//! lookup only and does not own or embed the referenced record. On the wire it
//! is the URI `resource:<namespace>.<Type>#<id>`.

use crate::core::error::LedgerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RELATIONSHIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^resource:([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\.([A-Za-z][A-Za-z0-9_]*)#(.+)$")
        .expect("relationship pattern is valid")
});

/// Every registry the ledger keeps, assets and participants alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Request,
    Container,
    Producer,
    Manufacturer,
    Transporter,
    Regulator,
    HistorianRecord,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Request => "Request",
            RecordKind::Container => "Container",
            RecordKind::Producer => "Producer",
            RecordKind::Manufacturer => "Manufacturer",
            RecordKind::Transporter => "Transporter",
            RecordKind::Regulator => "Regulator",
            RecordKind::HistorianRecord => "HistorianRecord",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "request" => Ok(RecordKind::Request),
            "container" => Ok(RecordKind::Container),
            "producer" => Ok(RecordKind::Producer),
            "manufacturer" => Ok(RecordKind::Manufacturer),
            "transporter" => Ok(RecordKind::Transporter),
            "regulator" => Ok(RecordKind::Regulator),
            "historianrecord" | "historian" => Ok(RecordKind::HistorianRecord),
            _ => Err(LedgerError::ValidationError(format!(
                "unknown record type '{}'",
                s
            ))),
        }
    }
}

/// Weak reference to a record in another registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Relationship {
    namespace: String,
    kind: RecordKind,
    id: String,
}

impl Relationship {
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        &self.id
    }

    /// `<namespace>.<Type>`, e.g. `org.acme.container_network.Producer`.
    pub fn fully_qualified_type(&self) -> String {
        format!("{}.{}", self.namespace, self.kind)
    }

    /// Fail unless this reference points into the `expected` registry.
    pub fn expect_kind(&self, expected: RecordKind) -> Result<&Self, LedgerError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(LedgerError::ValidationError(format!(
                "expected a {} reference, got {}",
                expected, self
            )))
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource:{}#{}", self.fully_qualified_type(), self.id)
    }
}

impl FromStr for Relationship {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RELATIONSHIP_RE.captures(s).ok_or_else(|| {
            LedgerError::ValidationError(format!("invalid relationship URI '{}'", s))
        })?;
        let kind: RecordKind = caps[2].parse()?;
        let id = caps[3].to_string();
        validate_identifier(kind, &id)?;
        Ok(Relationship {
            namespace: caps[1].to_string(),
            kind,
            id,
        })
    }
}

impl TryFrom<String> for Relationship {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Relationship> for String {
    fn from(value: Relationship) -> Self {
        value.to_string()
    }
}

pub fn validate_identifier(kind: RecordKind, id: &str) -> Result<(), LedgerError> {
    if id.trim().is_empty() {
        return Err(LedgerError::ValidationError(format!(
            "{} identifier cannot be empty",
            kind
        )));
    }
    if id != id.trim() || id.chars().any(|c| c == '#' || c.is_control()) {
        return Err(LedgerError::ValidationError(format!(
            "invalid {} identifier '{}': no '#', control characters, or surrounding whitespace",
            kind, id
        )));
    }
    Ok(())
}

/// Builds references inside one namespace.
#[derive(Debug, Clone)]
pub struct Factory {
    namespace: String,
}

impl Factory {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn new_relationship(
        &self,
        kind: RecordKind,
        id: &str,
    ) -> Result<Relationship, LedgerError> {
        validate_identifier(kind, id)?;
        Ok(Relationship {
            namespace: self.namespace.clone(),
            kind,
            id: id.to_string(),
        })
    }

    /// Accept either a bare identifier or a full relationship URI for `kind`.
    pub fn resolve_reference(
        &self,
        kind: RecordKind,
        raw: &str,
    ) -> Result<Relationship, LedgerError> {
        if raw.starts_with("resource:") {
            let rel: Relationship = raw.parse()?;
            rel.expect_kind(kind)?;
            if rel.namespace != self.namespace {
                return Err(LedgerError::ValidationError(format!(
                    "reference {} is outside namespace {}",
                    rel, self.namespace
                )));
            }
            Ok(rel)
        } else {
            self.new_relationship(kind, raw)
        }
    }
}
