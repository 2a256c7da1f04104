//! Registry configuration

use crate::index::ALL_PROPERTIES_KEY;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Ledger key holding the denormalized index.
    pub index_key: String,
    /// Accept `Folio_ID` and `BeneficialOwner` as search field names.
    pub allow_legacy_field_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_key: ALL_PROPERTIES_KEY.to_string(),
            allow_legacy_field_names: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let cfg: RegistryConfig =
            serde_json::from_str(r#"{"allow_legacy_field_names": false}"#).unwrap();
        assert_eq!(cfg.index_key, "allProps");
        assert!(!cfg.allow_legacy_field_names);
    }
}
