//! Secondary index: one denormalized list of every property under a single key.
//!
//! Every mutation is a read-modify-write of the whole blob. The registry relies
//! on the execution host to serialize calls touching the same ledger state;
//! without that, two concurrent writers lose each other's update.

use crate::codec;
use crate::errors::{RegistryError, Result};
use crate::types::{AllProperties, Property, SearchField};
use folio_storage::LedgerStore;
use tracing::debug;

/// Well-known key the index blob lives under.
pub const ALL_PROPERTIES_KEY: &str = "allProps";

pub struct PropertyIndex<'a> {
    store: &'a dyn LedgerStore,
    key: &'a str,
}

impl<'a> PropertyIndex<'a> {
    pub fn new(store: &'a dyn LedgerStore, key: &'a str) -> Self {
        Self { store, key }
    }

    /// Load the index; `None` when the key has never been written.
    pub fn load(&self) -> Result<Option<AllProperties>> {
        let bytes = self
            .store
            .get_state(self.key)
            .map_err(|e| RegistryError::IndexUnavailable(format!("failed to read index: {e}")))?;

        match bytes {
            Some(bytes) => codec::decode_index(&bytes).map(Some).map_err(|e| {
                RegistryError::IndexUnavailable(format!("index is corrupt: {e}"))
            }),
            None => Ok(None),
        }
    }

    /// Load the index, treating an absent key as empty.
    pub fn load_or_empty(&self) -> Result<AllProperties> {
        Ok(self.load()?.unwrap_or_default())
    }

    pub fn save(&self, index: &AllProperties) -> Result<()> {
        let bytes = codec::encode_index(index)?;
        self.store.put_state(self.key, &bytes)?;
        debug!(key = self.key, entries = index.properties.len(), "index saved");
        Ok(())
    }

    /// Records matching `field == value`, in stored order.
    ///
    /// Fails with `IndexUnavailable` when the index has never been written.
    pub fn filter(&self, field: SearchField, value: &str) -> Result<Vec<Property>> {
        let index = self
            .load()?
            .ok_or_else(|| RegistryError::IndexUnavailable("no properties found".to_string()))?;

        Ok(index
            .properties
            .into_iter()
            .filter(|p| field.matches(p, value))
            .collect())
    }

    /// Rebuild the index without any entry for `folio_id` and persist it,
    /// even when nothing matched. Returns how many entries were dropped.
    pub fn remove(&self, folio_id: &str) -> Result<usize> {
        let mut index = self.load_or_empty()?;
        let before = index.properties.len();
        index.properties.retain(|p| p.folio_id.as_str() != folio_id);
        let dropped = before - index.properties.len();
        self.save(&index)?;
        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeneficialOwner, FolioId};
    use folio_storage::MemoryLedgerStore;

    fn property(folio: &str, owner: &str) -> Property {
        Property::new(
            FolioId::parse(folio).unwrap(),
            owner,
            vec![BeneficialOwner::new("John", "100")],
            "1 Any Rd",
        )
    }

    fn seed(index: &PropertyIndex<'_>, properties: Vec<Property>) {
        index.save(&AllProperties { properties }).unwrap();
    }

    #[test]
    fn test_absent_index_loads_as_none() {
        let store = MemoryLedgerStore::new();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        assert!(index.load().unwrap().is_none());
        assert!(index.load_or_empty().unwrap().properties.is_empty());
    }

    #[test]
    fn test_filter_on_absent_index_fails() {
        let store = MemoryLedgerStore::new();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        assert!(matches!(
            index.filter(SearchField::All, ""),
            Err(RegistryError::IndexUnavailable(_))
        ));
    }

    #[test]
    fn test_filter_keeps_stored_order() {
        let store = MemoryLedgerStore::new();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        seed(
            &index,
            vec![
                property("2/00002", "Ann"),
                property("1/00001", "Bob"),
                property("3/00003", "Ann"),
            ],
        );

        let anns = index.filter(SearchField::LegalOwner, "Ann").unwrap();
        let ids: Vec<_> = anns.iter().map(|p| p.folio_id.as_str()).collect();
        assert_eq!(ids, vec!["2/00002", "3/00003"]);

        assert_eq!(index.filter(SearchField::All, "").unwrap().len(), 3);
    }

    #[test]
    fn test_remove_drops_every_occurrence_and_always_writes() {
        let store = MemoryLedgerStore::new();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        seed(
            &index,
            vec![
                property("1/00001", "Ann"),
                property("2/00002", "Bob"),
                property("1/00001", "Ann"),
            ],
        );

        assert_eq!(index.remove("1/00001").unwrap(), 2);
        let left = index.load().unwrap().unwrap();
        assert_eq!(left.properties.len(), 1);
        assert_eq!(left.properties[0].folio_id.as_str(), "2/00002");

        assert_eq!(index.remove("9/99999").unwrap(), 0);
        assert_eq!(index.load().unwrap().unwrap(), left);
    }

    #[test]
    fn test_remove_on_absent_index_writes_empty_blob() {
        let store = MemoryLedgerStore::new();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        assert_eq!(index.remove("1/00001").unwrap(), 0);
        assert!(store.contains_key(ALL_PROPERTIES_KEY));
    }

    #[test]
    fn test_corrupt_index_is_unavailable() {
        let store = MemoryLedgerStore::new();
        store.put_state(ALL_PROPERTIES_KEY, b"[oops").unwrap();
        let index = PropertyIndex::new(&store, ALL_PROPERTIES_KEY);
        assert!(matches!(
            index.load(),
            Err(RegistryError::IndexUnavailable(_))
        ));
        assert!(matches!(
            index.load_or_empty(),
            Err(RegistryError::IndexUnavailable(_))
        ));
        assert!(matches!(
            index.remove("1/00001"),
            Err(RegistryError::IndexUnavailable(_))
        ));
    }
}
