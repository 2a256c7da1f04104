//! Host configuration: optional TOML file, then `FOLIO_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File as ConfigFile};
use folio_registry::{RegistryConfig, ALL_PROPERTIES_KEY};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_format: String,
    pub index_key: String,
    pub allow_legacy_field_names: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            index_key: ALL_PROPERTIES_KEY.to_string(),
            allow_legacy_field_names: true,
        }
    }
}

impl AppConfig {
    pub fn load(config_path_override: Option<&Path>) -> Result<Self> {
        let resolved_path = if let Some(path) = config_path_override {
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            Some(path.to_path_buf())
        } else {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if path.exists() {
                Some(path)
            } else {
                None
            }
        };

        let mut builder = Config::builder();

        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }

        builder = builder.add_source(Environment::with_prefix("FOLIO"));

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match &resolved_path {
                Some(path) => format!("failed to load configuration from {}", path.display()),
                None => "failed to load configuration from environment".to_string(),
            })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            index_key: self.index_key.clone(),
            allow_legacy_field_names: self.allow_legacy_field_names,
        }
    }
}
