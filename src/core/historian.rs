//! Historian: one record per committed transaction, written inside the same
//! unit of work as the transaction's own effects.

use crate::core::registry::Record;
use crate::core::resource::RecordKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistorianRecord {
    /// 1-based commit position.
    pub sequence: u64,
    pub transaction_id: String,
    pub transaction_type: String,
    pub timestamp: String,
    pub actor: String,
    /// sha256 of the canonical JSON of the submitted transaction.
    pub payload_hash: String,
    pub event_ids: Vec<String>,
}

impl Record for HistorianRecord {
    const KIND: RecordKind = RecordKind::HistorianRecord;

    fn identifier(&self) -> &str {
        &self.transaction_id
    }
}

pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    // serde_json maps are sorted, so equal values hash equally.
    let bytes = serde_json::to_vec(&serde_json::to_value(value)?)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
