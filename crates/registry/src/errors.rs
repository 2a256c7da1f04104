//! Error types for the property registry

use folio_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid folio identifier: {folio_id:?}")]
    InvalidIdentifier { folio_id: String },

    #[error("Property already exists: {folio_id}")]
    DuplicateKey { folio_id: String },

    #[error("Property not found: {folio_id}")]
    NotFound { folio_id: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Received unknown function invocation: {function}")]
    UnrecognizedFunction { function: String },

    #[error("Unrecognized property search field: {field}")]
    UnrecognizedSearchField { field: String },

    #[error("Property index unavailable: {0}")]
    IndexUnavailable(String),

    #[error(
        "Property {folio_id} changed but the index was not updated ({source}); run reconcile"
    )]
    IndexOutOfSync {
        folio_id: String,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] StorageError),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            RegistryError::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            RegistryError::NotFound { .. } => ErrorCode::NotFound,
            RegistryError::InvalidArguments(_) => ErrorCode::InvalidArguments,
            RegistryError::UnrecognizedFunction { .. } => ErrorCode::UnrecognizedFunction,
            RegistryError::UnrecognizedSearchField { .. } => ErrorCode::UnrecognizedSearchField,
            RegistryError::IndexUnavailable(_) => ErrorCode::IndexUnavailable,
            RegistryError::IndexOutOfSync { .. } => ErrorCode::IndexOutOfSync,
            RegistryError::Encoding(_) => ErrorCode::Encoding,
            RegistryError::Ledger(_) => ErrorCode::Ledger,
        }
    }
}

/// Machine-readable failure category carried by every failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidIdentifier,
    DuplicateKey,
    NotFound,
    InvalidArguments,
    UnrecognizedFunction,
    UnrecognizedSearchField,
    IndexUnavailable,
    IndexOutOfSync,
    Encoding,
    Ledger,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
