//! Assets, participants, and the events the network emits.

use crate::core::error::LedgerError;
use crate::core::events::Event;
use crate::core::registry::Record;
use crate::core::resource::{RecordKind, Relationship, validate_identifier};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Placed,
    ScheduledForManufacture,
    VinAssigned,
    TransporterAssigned,
    Delivered,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Placed,
        RequestStatus::ScheduledForManufacture,
        RequestStatus::VinAssigned,
        RequestStatus::TransporterAssigned,
        RequestStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Placed => "PLACED",
            RequestStatus::ScheduledForManufacture => "SCHEDULED_FOR_MANUFACTURE",
            RequestStatus::VinAssigned => "VIN_ASSIGNED",
            RequestStatus::TransporterAssigned => "TRANSPORTER_ASSIGNED",
            RequestStatus::Delivered => "DELIVERED",
        }
    }

    /// Whether this status needs a VIN on the transaction.
    pub fn requires_vin(&self) -> bool {
        matches!(
            self,
            RequestStatus::VinAssigned | RequestStatus::TransporterAssigned
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                LedgerError::ValidationError(format!(
                    "unknown request status '{}'; expected one of: {}",
                    s,
                    Self::ALL.map(|st| st.as_str()).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Available,
    Active,
    OutOfService,
}

impl ContainerStatus {
    pub const ALL: [ContainerStatus; 3] = [
        ContainerStatus::Available,
        ContainerStatus::Active,
        ContainerStatus::OutOfService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Available => "AVAILABLE",
            ContainerStatus::Active => "ACTIVE",
            ContainerStatus::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                LedgerError::ValidationError(format!("unknown container status '{}'", s))
            })
    }
}

/// Value type copied (never shared) from a request into its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetails {
    /// Manufacturer reference.
    pub make: Relationship,
    pub model_type: String,
    pub colour: String,
}

impl ContainerDetails {
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.make.expect_kind(RecordKind::Manufacturer)?;
        if self.model_type.trim().is_empty() {
            return Err(LedgerError::missing_field("containerDetails.modelType"));
        }
        if self.colour.trim().is_empty() {
            return Err(LedgerError::missing_field("containerDetails.colour"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: String,
    pub container_details: ContainerDetails,
    pub request_status: RequestStatus,
    /// Producer reference.
    pub requester: Relationship,
    #[serde(default)]
    pub options: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Record for Request {
    const KIND: RecordKind = RecordKind::Request;

    fn identifier(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub vin: String,
    pub container_details: ContainerDetails,
    pub container_status: ContainerStatus,
    /// Current custodian: a Producer or a Transporter. Unset until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Relationship>,
}

impl Record for Container {
    const KIND: RecordKind = RecordKind::Container;

    fn identifier(&self) -> &str {
        &self.vin
    }
}

impl Container {
    pub fn new(
        vin: &str,
        container_details: ContainerDetails,
        container_status: ContainerStatus,
    ) -> Result<Self, LedgerError> {
        validate_identifier(RecordKind::Container, vin)?;
        Ok(Self {
            vin: vin.to_string(),
            container_details,
            container_status,
            owner: None,
        })
    }
}

/// Identity-only record referenced by assets; never owned by them.
pub trait Participant: Record {
    fn display_name(&self) -> Option<&str>;
}

macro_rules! participant {
    ($($name:ident => $kind:expr),* $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct $name {
                pub id: String,
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub name: Option<String>,
            }

            impl $name {
                pub fn new(id: &str, name: Option<&str>) -> Result<Self, LedgerError> {
                    validate_identifier($kind, id)?;
                    Ok(Self {
                        id: id.to_string(),
                        name: name.map(str::to_string),
                    })
                }
            }

            impl Record for $name {
                const KIND: RecordKind = $kind;

                fn identifier(&self) -> &str {
                    &self.id
                }
            }

            impl Participant for $name {
                fn display_name(&self) -> Option<&str> {
                    self.name.as_deref()
                }
            }
        )*
    };
}

participant! {
    Producer => RecordKind::Producer,
    Manufacturer => RecordKind::Manufacturer,
    Transporter => RecordKind::Transporter,
    Regulator => RecordKind::Regulator,
}

/// Where the owner set on TRANSPORTER_ASSIGNED came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerSource {
    /// The transaction named the transporter explicitly.
    Transporter,
    /// No transporter on the transaction; the requester's identifier was used.
    RequesterFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequestEvent {
    pub request_id: String,
    pub container_details: ContainerDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub requester: Relationship,
}

impl Event for PlaceRequestEvent {
    const EVENT_TYPE: &'static str = "PlaceRequestEvent";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatusEvent {
    pub request_status: RequestStatus,
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_source: Option<OwnerSource>,
}

impl Event for UpdateRequestStatusEvent {
    const EVENT_TYPE: &'static str = "UpdateRequestStatusEvent";
}
