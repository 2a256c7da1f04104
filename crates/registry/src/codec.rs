//! Byte encoding of property records and the index blob.
//!
//! Records are stored as JSON. Every failure surfaces as
//! [`RegistryError::Encoding`]; nothing is decoded leniently.

use crate::errors::Result;
use crate::types::{AllProperties, Property};

pub fn encode_property(property: &Property) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(property)?)
}

pub fn decode_property(bytes: &[u8]) -> Result<Property> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_index(index: &AllProperties) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(index)?)
}

pub fn decode_index(bytes: &[u8]) -> Result<AllProperties> {
    Ok(serde_json::from_slice(bytes)?)
}
