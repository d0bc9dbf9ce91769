//! Child window name cache.
//!
//! Each window keeps the names of the child windows it opened so that a
//! reloaded window can reopen (or at least re-attach to) them. Every
//! mutation is written straight through to the persistence store; there is
//! no buffering.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store: Arc<dyn PersistenceStore> = Arc::new(MemoryStore::new());
//! let mut cache = WindowNameCache::new("main", store).init()?;
//!
//! cache.add_name("popup")?;
//! assert_eq!(cache.names(), ["popup"]);
//!
//! cache.remove_name("popup")?;
//! ```

pub mod error;
pub mod model;
pub mod storage;

pub use error::{CacheError, CacheResult};
pub use model::NameTable;
pub use storage::{DEFAULT_CACHE_KEY, FileStore, MemoryStore, PersistenceStore};

use std::sync::Arc;

/// Durable list of child window names for one window.
///
/// Only the owner's entry is ever changed by an instance. Entries written
/// by other windows are kept as they were read during [`init`] and written
/// back with every flush.
///
/// [`init`]: WindowNameCache::init
pub struct WindowNameCache {
    key: String,
    owner: String,
    table: NameTable,
    store: Arc<dyn PersistenceStore>,
}

impl WindowNameCache {
    pub fn new(owner: impl Into<String>, store: Arc<dyn PersistenceStore>) -> Self {
        let owner = owner.into();
        Self {
            key: DEFAULT_CACHE_KEY.to_string(),
            table: NameTable::with_owner(&owner),
            owner,
            store,
        }
    }

    /// Uses a store key other than [`DEFAULT_CACHE_KEY`].
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Loads the stored table. Missing or unreadable data resets the
    /// owner's entry to empty.
    pub fn init(mut self) -> CacheResult<Self> {
        match self.read_stored() {
            Some(stored) => {
                let names = stored
                    .get(&self.owner)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                self.table = stored;
                self.hard_set(names)?;
            }
            None => self.clear()?,
        }
        log::debug!(
            "name cache for {} restored {} entries",
            self.owner,
            self.names().len()
        );
        Ok(self)
    }

    /// Appends `name` to the owner's list. Repeated names are kept.
    pub fn add_name(&mut self, name: &str) -> CacheResult<()> {
        if name.is_empty() {
            return Err(CacheError::Contract(
                "add_name requires a non-empty window name".to_string(),
            ));
        }
        let mut names = self.names().to_vec();
        names.push(name.to_string());
        self.hard_set(names)
    }

    /// Drops every occurrence of `name` from the owner's list.
    pub fn remove_name(&mut self, name: &str) -> CacheResult<()> {
        if self.table.is_empty() {
            return Ok(());
        }
        let names = self
            .names()
            .iter()
            .filter(|existing| existing.as_str() != name)
            .cloned()
            .collect();
        self.hard_set(names)
    }

    pub fn table(&self) -> &NameTable {
        &self.table
    }

    /// The owner's child names, in the order they were recorded.
    pub fn names(&self) -> &[String] {
        self.table.get(&self.owner).unwrap_or(&[])
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.hard_set(Vec::new())
    }

    /// Replaces the owner's list. The in-memory table only changes once
    /// the store has accepted the new one.
    fn hard_set(&mut self, names: Vec<String>) -> CacheResult<()> {
        let mut table = self.table.clone();
        table.set(&self.owner, names);
        self.flush(&table)?;
        self.table = table;
        Ok(())
    }

    fn flush(&self, table: &NameTable) -> CacheResult<()> {
        let data = serde_json::to_string(table)
            .map_err(|e| CacheError::SerializeError(e.to_string()))?;
        self.store.set(&self.key, &data)
    }

    fn read_stored(&self) -> Option<NameTable> {
        let data = match self.store.get(&self.key) {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("name cache {} unreadable, starting empty: {}", self.key, e);
                return None;
            }
        };
        match NameTable::from_json(&data) {
            Ok(table) => Some(table),
            Err(e) => {
                log::warn!("name cache {} malformed, starting empty: {}", self.key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_store() -> (MemoryStore, Arc<dyn PersistenceStore>) {
        let store = MemoryStore::new();
        let dyn_store: Arc<dyn PersistenceStore> = Arc::new(store.clone());
        (store, dyn_store)
    }

    fn stored(store: &MemoryStore) -> NameTable {
        let data = store.get(DEFAULT_CACHE_KEY).unwrap().unwrap();
        NameTable::from_json(&data).unwrap()
    }

    #[test]
    fn test_new_does_not_touch_store() {
        let (store, dyn_store) = shared_store();
        let cache = WindowNameCache::new("main", dyn_store);
        assert!(cache.names().is_empty());
        assert!(store.get(DEFAULT_CACHE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_init_without_stored_data_writes_empty_entry() {
        let (store, dyn_store) = shared_store();
        let cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        assert!(cache.names().is_empty());
        assert_eq!(stored(&store), NameTable::with_owner("main"));
    }

    #[test]
    fn test_every_add_is_written_through() {
        let (store, dyn_store) = shared_store();
        let mut cache = WindowNameCache::new("main", dyn_store).init().unwrap();

        cache.add_name("child1").unwrap();
        assert_eq!(stored(&store).get("main").unwrap(), ["child1"]);

        cache.add_name("child2").unwrap();
        assert_eq!(stored(&store).get("main").unwrap(), ["child1", "child2"]);
    }

    #[test]
    fn test_remove_filters_all_duplicates() {
        let (store, dyn_store) = shared_store();
        let mut cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        for name in ["popup", "report", "popup"] {
            cache.add_name(name).unwrap();
        }

        cache.remove_name("popup").unwrap();
        assert_eq!(cache.names(), ["report"]);
        assert_eq!(stored(&store).get("main").unwrap(), ["report"]);

        cache.remove_name("never-added").unwrap();
        assert_eq!(cache.names(), ["report"]);
    }

    #[test]
    fn test_roundtrip_through_fresh_instance() {
        let (_store, dyn_store) = shared_store();
        let mut cache = WindowNameCache::new("main", dyn_store.clone())
            .init()
            .unwrap();
        cache.add_name("child1").unwrap();
        cache.add_name("child2").unwrap();
        drop(cache);

        let reloaded = WindowNameCache::new("main", dyn_store).init().unwrap();
        assert_eq!(reloaded.names(), ["child1", "child2"]);
    }

    #[test]
    fn test_empty_name_is_rejected_without_mutation() {
        let (store, dyn_store) = shared_store();
        let mut cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        cache.add_name("popup").unwrap();

        let err = cache.add_name("").unwrap_err();
        assert!(matches!(err, CacheError::Contract(_)));
        assert_eq!(cache.names(), ["popup"]);
        assert_eq!(stored(&store).get("main").unwrap(), ["popup"]);
    }

    #[test]
    fn test_foreign_entries_are_written_back_unmodified() {
        let (store, dyn_store) = shared_store();
        store
            .set(
                DEFAULT_CACHE_KEY,
                r#"{"main":["old"],"popup":["details"]}"#,
            )
            .unwrap();

        let mut cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        assert_eq!(cache.names(), ["old"]);
        cache.add_name("report").unwrap();

        let table = stored(&store);
        assert_eq!(table.get("main").unwrap(), ["old", "report"]);
        assert_eq!(table.get("popup").unwrap(), ["details"]);
    }

    #[test]
    fn test_owner_missing_from_stored_table_defaults_empty() {
        let (store, dyn_store) = shared_store();
        store
            .set(DEFAULT_CACHE_KEY, r#"{"popup":["details"]}"#)
            .unwrap();

        let cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        assert!(cache.names().is_empty());
        assert!(cache.table().contains("popup"));
    }

    #[test]
    fn test_malformed_stored_data_is_treated_as_missing() {
        let (store, dyn_store) = shared_store();
        store.set(DEFAULT_CACHE_KEY, "not json at all").unwrap();

        let cache = WindowNameCache::new("main", dyn_store).init().unwrap();
        assert!(cache.names().is_empty());
        assert_eq!(stored(&store), NameTable::with_owner("main"));
    }

    #[test]
    fn test_custom_key() {
        let (store, dyn_store) = shared_store();
        let mut cache = WindowNameCache::new("main", dyn_store)
            .with_key("other_key")
            .init()
            .unwrap();
        cache.add_name("popup").unwrap();
        assert_eq!(cache.key(), "other_key");
        assert!(store.get(DEFAULT_CACHE_KEY).unwrap().is_none());
        assert!(store.get("other_key").unwrap().is_some());
    }

    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl PersistenceStore for ReadOnlyStore {
        fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> CacheResult<()> {
            Err(CacheError::WriteError("store is read-only".to_string()))
        }
    }

    #[test]
    fn test_failed_write_leaves_names_unchanged() {
        let inner = MemoryStore::new();
        inner
            .set(DEFAULT_CACHE_KEY, r#"{"main":["popup"]}"#)
            .unwrap();
        let mut cache = WindowNameCache::new("main", Arc::new(inner.clone()))
            .init()
            .unwrap();
        cache.store = Arc::new(ReadOnlyStore {
            inner: inner.clone(),
        });

        let err = cache.add_name("report").unwrap_err();
        assert!(matches!(err, CacheError::WriteError(_)));
        assert_eq!(cache.names(), ["popup"]);

        cache.remove_name("popup").unwrap_err();
        assert_eq!(cache.names(), ["popup"]);
        assert_eq!(stored(&inner), *cache.table());
    }

    #[test]
    fn test_init_fails_when_store_rejects_writes() {
        let store: Arc<dyn PersistenceStore> = Arc::new(ReadOnlyStore {
            inner: MemoryStore::new(),
        });
        let err = WindowNameCache::new("main", store).init().err().unwrap();
        assert!(matches!(err, CacheError::WriteError(_)));
    }

    // Two windows rewrite the whole table under one key, so the later
    // writer overwrites what the earlier one added after it was read.
    #[test]
    fn test_concurrent_writers_lose_updates() {
        let (store, dyn_store) = shared_store();
        let mut main = WindowNameCache::new("main", dyn_store.clone())
            .init()
            .unwrap();
        let mut popup = WindowNameCache::new("popup", dyn_store).init().unwrap();

        main.add_name("report").unwrap();
        popup.add_name("details").unwrap();

        let table = stored(&store);
        assert_eq!(table.get("popup").unwrap(), ["details"]);
        assert_eq!(table.get("main").unwrap(), &[] as &[String]);
    }
}
