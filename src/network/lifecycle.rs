//! Request lifecycle: advances a request's status and drives the container
//! side effects of VIN and transporter assignment.
//!
//! | status               | container effect                                     |
//! |----------------------|------------------------------------------------------|
//! | VIN_ASSIGNED         | create container `vin`, details copied, AVAILABLE    |
//! | TRANSPORTER_ASSIGNED | load container `vin`, ACTIVE, owner = transporter    |
//! | anything else        | none                                                 |
//!
//! The request is persisted with the new status in every case. No ordering
//! between statuses is enforced.

use crate::core::error::LedgerError;
use crate::core::registry::{self, UnitOfWork};
use crate::core::resource::{RecordKind, Relationship};
use crate::network::HandlerContext;
use crate::network::model::{
    Container, ContainerStatus, OwnerSource, Request, RequestStatus, Transporter,
    UpdateRequestStatusEvent,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatus {
    pub request: Relationship,
    pub request_status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    /// Transporter taking custody on TRANSPORTER_ASSIGNED. When absent the
    /// requester's identifier is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter: Option<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_source: Option<OwnerSource>,
}

pub fn update_request_status(
    ctx: &HandlerContext<'_>,
    uow: &mut dyn UnitOfWork,
    tx: &UpdateRequestStatus,
) -> Result<StatusUpdate, LedgerError> {
    tx.request.expect_kind(RecordKind::Request)?;
    let mut request: Request = registry::registry::<Request>(uow).get(tx.request.identifier())?;

    let vin = if tx.request_status.requires_vin() {
        Some(require_vin(tx.vin.as_deref())?)
    } else {
        None
    };

    let (container, owner_source) = match (tx.request_status, vin) {
        (RequestStatus::VinAssigned, Some(vin)) => {
            let container = Container::new(
                vin,
                request.container_details.clone(),
                ContainerStatus::Available,
            )?;
            registry::registry::<Container>(uow).add(&container)?;
            (Some(container), None)
        }
        (RequestStatus::TransporterAssigned, Some(vin)) => {
            let mut container: Container = registry::registry::<Container>(uow).get(vin)?;
            let (owner, source) = resolve_transporter(ctx, uow, tx, &request)?;
            container.container_status = ContainerStatus::Active;
            container.owner = Some(owner);
            registry::registry::<Container>(uow).update(&container)?;
            (Some(container), Some(source))
        }
        _ => (None, None),
    };

    request.request_status = tx.request_status;
    registry::registry::<Request>(uow).update(&request)?;

    registry::emit(
        uow,
        &UpdateRequestStatusEvent {
            request_status: request.request_status,
            request: request.clone(),
            owner_source,
        },
    )?;

    Ok(StatusUpdate {
        request,
        container,
        owner_source,
    })
}

fn require_vin(vin: Option<&str>) -> Result<&str, LedgerError> {
    match vin {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LedgerError::missing_field("vin")),
    }
}

/// The explicit transporter if given, otherwise a Transporter reference built
/// from the requester's identifier.
fn resolve_transporter(
    ctx: &HandlerContext<'_>,
    uow: &mut dyn UnitOfWork,
    tx: &UpdateRequestStatus,
    request: &Request,
) -> Result<(Relationship, OwnerSource), LedgerError> {
    let (owner, source) = match &tx.transporter {
        Some(transporter) => {
            transporter.expect_kind(RecordKind::Transporter)?;
            (
                ctx.factory
                    .new_relationship(RecordKind::Transporter, transporter.identifier())?,
                OwnerSource::Transporter,
            )
        }
        None => (
            ctx.factory
                .new_relationship(RecordKind::Transporter, request.requester.identifier())?,
            OwnerSource::RequesterFallback,
        ),
    };

    if ctx.strict_relationships
        && !registry::registry::<Transporter>(uow).exists(owner.identifier())?
    {
        return Err(LedgerError::not_found(
            RecordKind::Transporter,
            owner.identifier(),
        ));
    }
    Ok((owner, source))
}
