//! Types for the property registry

use crate::errors::{RegistryError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status code of a freshly registered property.
pub const STATUS_ACTIVE: i32 = 0;

/// One digit, a `/` or `.` separator, five digits. Anchored at both ends.
static FOLIO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9][/.][0-9]{5}$").expect("folio id pattern is a valid regex")
});

/// Folio identifier, the primary key of a property record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolioId(String);

impl FolioId {
    /// Validate and wrap a folio identifier.
    pub fn parse(folio_id: impl Into<String>) -> Result<Self> {
        let folio_id = folio_id.into();
        if Self::is_valid(&folio_id) {
            Ok(Self(folio_id))
        } else {
            Err(RegistryError::InvalidIdentifier { folio_id })
        }
    }

    /// Check an identifier against the required shape, e.g. `1/12345` or `1.12345`.
    ///
    /// Digits are ASCII only, the separator is exactly `/` or `.`, and the
    /// whole string must match; surrounding whitespace is rejected.
    pub fn is_valid(candidate: &str) -> bool {
        FOLIO_ID_PATTERN.is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A party holding a stated interest in a property. The percentage is kept
/// as free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficialOwner {
    pub name: String,
    pub percent: String,
}

impl BeneficialOwner {
    pub fn new(name: impl Into<String>, percent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percent: percent.into(),
        }
    }
}

/// A registered real-estate ownership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub folio_id: FolioId,
    #[serde(rename = "legalOwner")]
    pub legal_owner: String,
    #[serde(rename = "beneficialOwners", default)]
    pub beneficial_owners: Vec<BeneficialOwner>,
    pub address: String,
    pub status: i32,
}

impl Property {
    /// Build an active property record.
    pub fn new(
        folio_id: FolioId,
        legal_owner: impl Into<String>,
        beneficial_owners: Vec<BeneficialOwner>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            folio_id,
            legal_owner: legal_owner.into(),
            beneficial_owners,
            address: address.into(),
            status: STATUS_ACTIVE,
        }
    }

    /// Whether any beneficial owner carries exactly this name.
    pub fn has_beneficial_owner(&self, name: &str) -> bool {
        self.beneficial_owners.iter().any(|o| o.name == name)
    }
}

/// Denormalized snapshot of every registered property, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllProperties {
    pub properties: Vec<Property>,
}

/// Field a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    All,
    FolioId,
    Address,
    LegalOwner,
    BeneficialOwnerName,
}

impl SearchField {
    /// Parse a search field name, optionally accepting the legacy spellings
    /// `Folio_ID` and `BeneficialOwner`.
    pub fn parse(field: &str, allow_legacy: bool) -> Result<Self> {
        match field {
            "ALL" => Ok(SearchField::All),
            "FolioID" => Ok(SearchField::FolioId),
            "Address" => Ok(SearchField::Address),
            "LegalOwner" => Ok(SearchField::LegalOwner),
            "BeneficialOwnerName" => Ok(SearchField::BeneficialOwnerName),
            "Folio_ID" if allow_legacy => Ok(SearchField::FolioId),
            "BeneficialOwner" if allow_legacy => Ok(SearchField::BeneficialOwnerName),
            _ => Err(RegistryError::UnrecognizedSearchField {
                field: field.to_string(),
            }),
        }
    }

    /// Exact, case-sensitive match of `value` against this field of `property`.
    pub fn matches(&self, property: &Property, value: &str) -> bool {
        match self {
            SearchField::All => true,
            SearchField::FolioId => property.folio_id.as_str() == value,
            SearchField::Address => property.address == value,
            SearchField::LegalOwner => property.legal_owner == value,
            SearchField::BeneficialOwnerName => property.has_beneficial_owner(value),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::All => "ALL",
            SearchField::FolioId => "FolioID",
            SearchField::Address => "Address",
            SearchField::LegalOwner => "LegalOwner",
            SearchField::BeneficialOwnerName => "BeneficialOwnerName",
        }
    }
}

impl FromStr for SearchField {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, false)
    }
}
