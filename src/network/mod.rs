//! The container network: its records and the transaction handlers that
//! advance them.
//!
//! - `intake`: PlaceRequest
//! - `lifecycle`: UpdateRequestStatus
//! - `demo`: SetupDemo
//! - `participants`: AddParticipant
//! - `ledger`: submission, dispatch, receipts, and queries

pub mod demo;
pub mod intake;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod participants;

use crate::core::resource::Factory;

/// Capabilities every handler receives explicitly.
pub struct HandlerContext<'a> {
    pub factory: &'a Factory,
    /// Require referenced participants to exist in their registries.
    pub strict_relationships: bool,
}
