//! Property registry service
//!
//! Orchestrates register, search, delete, direct lookup and index
//! reconciliation over an injected [`LedgerStore`], and converts every outcome
//! into a [`ResponseEnvelope`] at the host-facing entry points.
//!
//! Register and delete touch the primary record and then the index as two
//! separate ledger calls. If the second call fails the primary change stays in
//! place and the index disagrees with it (an omitted new record, or a stale
//! entry for a deleted one); this is reported as
//! [`RegistryError::IndexOutOfSync`] and repaired by [`PropertyRegistry::reconcile`].

use crate::codec;
use crate::config::RegistryConfig;
use crate::envelope::{Payload, ReconcileReport, ResponseEnvelope};
use crate::errors::*;
use crate::index::PropertyIndex;
use crate::types::*;
use folio_storage::LedgerStore;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Property registry bound to one ledger store.
pub struct PropertyRegistry {
    store: Arc<dyn LedgerStore>,
    config: RegistryConfig,
}

impl PropertyRegistry {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: Arc<dyn LedgerStore>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn index(&self) -> PropertyIndex<'_> {
        PropertyIndex::new(self.store.as_ref(), &self.config.index_key)
    }

    /// Host `init` entry point. Touches no state.
    pub fn init<S: AsRef<str>>(&self, function: &str, _args: &[S]) -> ResponseEnvelope {
        debug!(function, "init");
        ResponseEnvelope::ok("Successfully Initialized")
    }

    /// Host entry point for state-changing functions: `init`, `register`, `reconcile`.
    pub fn invoke<S: AsRef<str>>(&self, function: &str, args: &[S]) -> ResponseEnvelope {
        let outcome = match function {
            "init" => return self.init(function, args),
            "register" => self
                .register(args)
                .map(|_| ResponseEnvelope::ok("Successfully property registered")),
            "reconcile" => expect_args(function, args, 0).and_then(|_| {
                let report = self.reconcile()?;
                Ok(ResponseEnvelope::ok("Property index reconciled")
                    .with_payload(Payload::Reconciled(report)))
            }),
            other => Err(RegistryError::UnrecognizedFunction {
                function: other.to_string(),
            }),
        };
        respond(function, outcome)
    }

    /// Host entry point for `search`, `delete` and `get`.
    ///
    /// Argument counts are checked before the operation runs.
    pub fn query<S: AsRef<str>>(&self, function: &str, args: &[S]) -> ResponseEnvelope {
        let outcome = match function {
            "search" => expect_args(function, args, 2).and_then(|_| {
                let found = self.search_by(args[0].as_ref(), args[1].as_ref())?;
                Ok(
                    ResponseEnvelope::ok(format!("{} properties found", found.len()))
                        .with_payload(Payload::Properties(AllProperties { properties: found })),
                )
            }),
            "delete" => expect_args(function, args, 1).and_then(|_| {
                self.delete(args[0].as_ref())?;
                Ok(ResponseEnvelope::ok("Successfully property deleted"))
            }),
            "get" => expect_args(function, args, 1).and_then(|_| {
                let property = self.get(args[0].as_ref())?;
                Ok(ResponseEnvelope::ok("Property found").with_payload(Payload::Property(property)))
            }),
            other => Err(RegistryError::UnrecognizedFunction {
                function: other.to_string(),
            }),
        };
        respond(function, outcome)
    }

    /// Register a property from `[address, folio_id, legal_owner, name1, percent1, ...]`.
    pub fn register<S: AsRef<str>>(&self, args: &[S]) -> Result<Property> {
        if args.len() < 4 {
            return Err(RegistryError::InvalidArguments(format!(
                "register expects address, folio id, legal owner and owner pairs, got {} arguments",
                args.len()
            )));
        }

        let folio_id = FolioId::parse(args[1].as_ref())?;
        let legal_owner = args[2].as_ref();
        if legal_owner.is_empty() {
            return Err(RegistryError::InvalidArguments(
                "legal owner is required".to_string(),
            ));
        }

        if self.store.get_state(folio_id.as_str())?.is_some() {
            return Err(RegistryError::DuplicateKey {
                folio_id: folio_id.as_str().to_string(),
            });
        }

        let property = Property::new(
            folio_id,
            legal_owner,
            beneficial_owners_from_args(&args[3..]),
            args[0].as_ref(),
        );
        let bytes = codec::encode_property(&property)?;

        // Read the index up front so an unreadable index fails before any write.
        let index = self.index();
        let mut all = index.load_or_empty()?;

        self.store.put_state(property.folio_id.as_str(), &bytes)?;

        all.properties.push(property.clone());
        if let Err(source) = index.save(&all) {
            error!(
                folio_id = %property.folio_id,
                error = %source,
                "primary record stored but index update failed"
            );
            return Err(RegistryError::IndexOutOfSync {
                folio_id: property.folio_id.as_str().to_string(),
                source: Box::new(source),
            });
        }

        info!(
            folio_id = %property.folio_id,
            owners = property.beneficial_owners.len(),
            "property registered"
        );
        Ok(property)
    }

    /// Search by field name as received from the host.
    pub fn search_by(&self, field: &str, value: &str) -> Result<Vec<Property>> {
        let field = SearchField::parse(field, self.config.allow_legacy_field_names)?;
        self.search(field, value)
    }

    /// Linear scan of the index in stored order.
    pub fn search(&self, field: SearchField, value: &str) -> Result<Vec<Property>> {
        let found = self.index().filter(field, value)?;
        debug!(field = field.as_str(), value, matches = found.len(), "search");
        Ok(found)
    }

    /// Delete a property's primary record and every index entry for it.
    ///
    /// Deleting an unknown folio succeeds. Returns the number of index entries dropped.
    pub fn delete(&self, folio_id: &str) -> Result<usize> {
        if folio_id == self.config.index_key {
            return Err(RegistryError::InvalidIdentifier {
                folio_id: folio_id.to_string(),
            });
        }

        self.store.del_state(folio_id)?;
        let dropped = match self.index().remove(folio_id) {
            Ok(dropped) => dropped,
            Err(source) => {
                error!(
                    folio_id,
                    error = %source,
                    "primary record deleted but index update failed"
                );
                return Err(RegistryError::IndexOutOfSync {
                    folio_id: folio_id.to_string(),
                    source: Box::new(source),
                });
            }
        };
        info!(folio_id, dropped, "property deleted");
        Ok(dropped)
    }

    /// Direct lookup of a primary record.
    pub fn get(&self, folio_id: &str) -> Result<Property> {
        if folio_id == self.config.index_key {
            return Err(RegistryError::InvalidIdentifier {
                folio_id: folio_id.to_string(),
            });
        }

        let bytes = self
            .store
            .get_state(folio_id)?
            .ok_or_else(|| RegistryError::NotFound {
                folio_id: folio_id.to_string(),
            })?;
        codec::decode_property(&bytes)
    }

    /// Rebuild the index from the primary records.
    ///
    /// Existing entries keep their order when their primary record still
    /// exists; primary records missing from the index are appended in key
    /// order. Needs the ledger's key-scan capability.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let mut primaries = BTreeMap::new();
        for key in self.store.keys()? {
            if key == self.config.index_key {
                continue;
            }
            if !FolioId::is_valid(&key) {
                warn!(key = %key, "skipping ledger key that is not a folio id");
                continue;
            }
            let Some(bytes) = self.store.get_state(&key)? else {
                warn!(key = %key, "scanned key vanished before it could be read");
                continue;
            };
            primaries.insert(key, codec::decode_property(&bytes)?);
        }

        let index = self.index();
        let existing = match index.load() {
            Ok(all) => all.unwrap_or_default(),
            Err(RegistryError::IndexUnavailable(reason)) => {
                warn!(%reason, "discarding unreadable index");
                AllProperties::default()
            }
            Err(e) => return Err(e),
        };

        let mut seen = HashSet::new();
        let mut rebuilt = Vec::with_capacity(primaries.len());
        for entry in &existing.properties {
            let key = entry.folio_id.as_str();
            if let Some(primary) = primaries.get(key) {
                if seen.insert(key.to_string()) {
                    rebuilt.push(primary.clone());
                }
            }
        }
        let kept = rebuilt.len();

        for (key, primary) in primaries {
            if !seen.contains(&key) {
                rebuilt.push(primary);
            }
        }

        let report = ReconcileReport {
            indexed: rebuilt.len(),
            added: rebuilt.len() - kept,
            dropped: existing.properties.len() - kept,
        };
        index.save(&AllProperties {
            properties: rebuilt,
        })?;

        info!(
            indexed = report.indexed,
            added = report.added,
            dropped = report.dropped,
            "property index reconciled"
        );
        Ok(report)
    }
}

/// Consume trailing arguments two at a time as `(name, percent)`.
///
/// A pair is kept only when both halves are non-empty; an odd trailing
/// argument is ignored.
pub fn beneficial_owners_from_args<S: AsRef<str>>(args: &[S]) -> Vec<BeneficialOwner> {
    args.chunks(2)
        .filter_map(|pair| match pair {
            [name, percent] if !name.as_ref().is_empty() && !percent.as_ref().is_empty() => {
                Some(BeneficialOwner::new(name.as_ref(), percent.as_ref()))
            }
            _ => None,
        })
        .collect()
}

fn expect_args<S: AsRef<str>>(function: &str, args: &[S], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RegistryError::InvalidArguments(format!(
            "Incorrect number of arguments passed to {function}: expected {expected}, got {}",
            args.len()
        )))
    }
}

fn respond(function: &str, outcome: Result<ResponseEnvelope>) -> ResponseEnvelope {
    match outcome {
        Ok(envelope) => envelope,
        Err(e) => {
            match &e {
                RegistryError::Ledger(_) | RegistryError::IndexOutOfSync { .. } => {
                    error!(function, code = ?e.code(), error = %e, "request failed")
                }
                _ => warn!(function, code = ?e.code(), error = %e, "request rejected"),
            }
            ResponseEnvelope::from(e)
        }
    }
}
