//! Participant registration and listing.

use crate::core::error::LedgerError;
use crate::core::registry::{self, Record, RecordReader, UnitOfWork};
use crate::core::resource::RecordKind;
use crate::network::model::{Manufacturer, Participant, Producer, Regulator, Transporter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipant {
    pub kind: RecordKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    pub kind: RecordKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ParticipantEntry {
    fn of<T: Participant>(participant: &T) -> Self {
        Self {
            kind: T::KIND,
            id: participant.identifier().to_string(),
            name: participant.display_name().map(str::to_string),
        }
    }
}

fn add<T: Participant>(
    uow: &mut dyn UnitOfWork,
    participant: T,
) -> Result<ParticipantEntry, LedgerError> {
    registry::registry::<T>(uow).add(&participant)?;
    Ok(ParticipantEntry::of(&participant))
}

fn entries<T: Participant, R: RecordReader + ?Sized>(
    reader: &R,
) -> Result<Vec<ParticipantEntry>, LedgerError> {
    Ok(registry::load_all::<T, R>(reader)?
        .iter()
        .map(ParticipantEntry::of)
        .collect())
}

fn not_a_participant(kind: RecordKind) -> LedgerError {
    LedgerError::ValidationError(format!("{} is not a participant type", kind))
}

pub fn add_participant(
    uow: &mut dyn UnitOfWork,
    tx: &AddParticipant,
) -> Result<ParticipantEntry, LedgerError> {
    let name = tx.name.as_deref();
    match tx.kind {
        RecordKind::Producer => add(uow, Producer::new(&tx.id, name)?),
        RecordKind::Manufacturer => add(uow, Manufacturer::new(&tx.id, name)?),
        RecordKind::Transporter => add(uow, Transporter::new(&tx.id, name)?),
        RecordKind::Regulator => add(uow, Regulator::new(&tx.id, name)?),
        other => Err(not_a_participant(other)),
    }
}

pub fn list_participants<R: RecordReader + ?Sized>(
    reader: &R,
    kind: RecordKind,
) -> Result<Vec<ParticipantEntry>, LedgerError> {
    match kind {
        RecordKind::Producer => entries::<Producer, R>(reader),
        RecordKind::Manufacturer => entries::<Manufacturer, R>(reader),
        RecordKind::Transporter => entries::<Transporter, R>(reader),
        RecordKind::Regulator => entries::<Regulator, R>(reader),
        other => Err(not_a_participant(other)),
    }
}
