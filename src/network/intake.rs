//! Request intake: turns a placement into a PLACED request.

use crate::core::error::LedgerError;
use crate::core::registry::{self, UnitOfWork};
use crate::core::resource::{RecordKind, Relationship, validate_identifier};
use crate::network::HandlerContext;
use crate::network::model::{ContainerDetails, PlaceRequestEvent, Producer, Request, RequestStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    pub request_id: String,
    pub container_details: ContainerDetails,
    /// Producer placing the request.
    pub requester: Relationship,
    /// Opaque configuration blob, stored as given.
    #[serde(default)]
    pub options: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub fn place_request(
    ctx: &HandlerContext<'_>,
    uow: &mut dyn UnitOfWork,
    tx: &PlaceRequest,
) -> Result<Request, LedgerError> {
    validate_identifier(RecordKind::Request, &tx.request_id)?;
    tx.container_details.validate()?;
    tx.requester.expect_kind(RecordKind::Producer)?;

    if ctx.strict_relationships
        && !registry::registry::<Producer>(uow).exists(tx.requester.identifier())?
    {
        return Err(LedgerError::not_found(
            RecordKind::Producer,
            tx.requester.identifier(),
        ));
    }

    // Re-issue the reference in this ledger's namespace.
    let requester = ctx
        .factory
        .new_relationship(RecordKind::Producer, tx.requester.identifier())?;

    let request = Request {
        request_id: tx.request_id.clone(),
        container_details: tx.container_details.clone(),
        request_status: RequestStatus::Placed,
        requester,
        options: tx.options.clone(),
        location: tx.location.clone(),
    };
    registry::registry::<Request>(uow).add(&request)?;

    registry::emit(
        uow,
        &PlaceRequestEvent {
            request_id: request.request_id.clone(),
            container_details: request.container_details.clone(),
            location: request.location.clone(),
            requester: request.requester.clone(),
        },
    )?;
    Ok(request)
}
