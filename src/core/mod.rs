//! Ledger infrastructure: storage, units of work, identities, events, audit.
//!
//! Nothing here knows about requests or containers; the handlers in
//! [`crate::network`] are written against these interfaces.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod historian;
pub mod memory;
pub mod output;
pub mod registry;
pub mod resource;
pub mod schemas;
pub mod sqlite;
pub mod store;
pub mod time;
