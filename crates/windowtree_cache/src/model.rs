//! Persisted shape of the name cache.
//!
//! The whole table is stored as one JSON object under a single store key:
//!
//! ```json
//! { "main": ["popup", "report"], "popup": ["details"] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CacheResult;

/// Mapping from a window name to the names of the children it opened,
/// in open order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl NameTable {
    /// Creates a table holding a single empty entry for `owner`.
    pub fn with_owner(owner: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(owner.to_string(), Vec::new());
        Self { entries }
    }

    pub fn from_json(data: &str) -> CacheResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Returns the child names recorded for `window`, if it has an entry.
    pub fn get(&self, window: &str) -> Option<&[String]> {
        self.entries.get(window).map(Vec::as_slice)
    }

    pub fn contains(&self, window: &str) -> bool {
        self.entries.contains_key(window)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the whole entry for `window`.
    pub(crate) fn set(&mut self, window: &str, names: Vec<String>) {
        self.entries.insert(window.to_string(), names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_owner_has_empty_entry() {
        let table = NameTable::with_owner("main");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("main"), Some(&[][..]));
        assert!(table.get("popup").is_none());
    }

    #[test]
    fn test_parses_foreign_entries() {
        let table =
            NameTable::from_json(r#"{"main":["popup"],"popup":["details","details"]}"#).unwrap();
        assert_eq!(table.get("main").unwrap(), ["popup"]);
        assert_eq!(table.get("popup").unwrap(), ["details", "details"]);
    }

    #[test]
    fn test_rejects_non_array_entry() {
        assert!(NameTable::from_json(r#"{"main":"popup"}"#).is_err());
        assert!(NameTable::from_json("[]").is_err());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut table = NameTable::with_owner("main");
        table.set("main", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"main":["a","b"]}"#);
    }
}
