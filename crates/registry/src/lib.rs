//! Property ownership registry
//!
//! Keeps one primary record per folio id in a ledger key-value store plus a
//! single denormalized index of every record for full-scan search. The
//! execution host dispatches `init`/`invoke`/`query` calls into
//! [`PropertyRegistry`] and receives a [`ResponseEnvelope`] back.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod index;
pub mod registry;
pub mod types;

pub use config::RegistryConfig;
pub use envelope::{Payload, ReconcileReport, ResponseEnvelope, STATUS_FAILED, STATUS_OK};
pub use errors::*;
pub use index::{PropertyIndex, ALL_PROPERTIES_KEY};
pub use registry::{beneficial_owners_from_args, PropertyRegistry};
pub use types::*;
