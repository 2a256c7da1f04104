//! Uniform response returned to the execution host for every entry point.

use crate::errors::{ErrorCode, RegistryError, Result};
use crate::types::{AllProperties, Property};
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "0";
pub const STATUS_FAILED: &str = "99";

/// Outcome of rebuilding the index from the primary records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Entries in the rebuilt index.
    pub indexed: usize,
    /// Primary records that were missing from the index.
    pub added: usize,
    /// Index entries whose primary record no longer exists.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Properties(AllProperties),
    Property(Property),
    Reconciled(ReconcileReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub message: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: STATUS_OK.to_string(),
            error_code: None,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn failure(error: &RegistryError) -> Self {
        Self {
            message: error.to_string(),
            status: STATUS_FAILED.to_string(),
            error_code: Some(error.code()),
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Matched records of a search response; empty for any other payload.
    pub fn properties(&self) -> &[Property] {
        match &self.payload {
            Some(Payload::Properties(all)) => &all.properties,
            _ => &[],
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<RegistryError> for ResponseEnvelope {
    fn from(error: RegistryError) -> Self {
        Self::failure(&error)
    }
}
