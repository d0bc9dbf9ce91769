//! Key/value persistence stores backing the name cache.
//!
//! The cache only needs `get`/`set` on string values. `MemoryStore` behaves
//! like a browser session store shared by every window of one process;
//! `FileStore` keeps each key in its own JSON file with the same
//! temp-file + backup rotation scheme used elsewhere for layout data.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use windowtree_shared::diagnostics;

use crate::error::{CacheError, CacheResult};

/// Key under which every window's name table is stored.
pub const DEFAULT_CACHE_KEY: &str = "window_manager_cache";

/// A session-scoped key/value store holding string documents.
pub trait PersistenceStore: Send + Sync {
    /// Returns the stored value for `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
}

/// In-process store. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.slots.lock().remove(key)
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one `<key>.json` per key under `root/profiles/<profile>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    profile: String,
}

impl FileStore {
    pub fn new(root: PathBuf, profile: String) -> Self {
        Self { root, profile }
    }

    fn load_from_backup(&self, path: &Path) -> Option<String> {
        let backup_path = path.with_extension("json.bak");
        if !backup_path.exists() {
            return None;
        }
        let data = fs::read_to_string(&backup_path).ok()?;
        serde_json::from_str::<serde_json::Value>(&data).ok()?;
        Some(data)
    }

    fn rotate_backups(&self, path: &Path) {
        if !path.exists() {
            return;
        }

        let bak2 = path.with_extension("json.bak.2");
        let bak1 = path.with_extension("json.bak.1");
        let bak = path.with_extension("json.bak");

        if let Err(e) = fs::remove_file(&bak2) {
            if e.kind() != std::io::ErrorKind::NotFound {
                diagnostics::log(format!("cache_backup_warning: remove bak2 failed: {}", e));
            }
        }

        if bak1.exists() {
            if let Err(e) = fs::rename(&bak1, &bak2) {
                diagnostics::log(format!("cache_backup_warning: rotate bak1->bak2 failed: {}", e));
            }
        }

        if bak.exists() {
            if let Err(e) = fs::rename(&bak, &bak1) {
                diagnostics::log(format!("cache_backup_warning: rotate bak->bak1 failed: {}", e));
            }
        }

        if let Err(e) = fs::rename(path, &bak) {
            diagnostics::log(format!("cache_backup_warning: create backup failed: {}", e));
        }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let profile_dir = self.root.join("profiles").join(&self.profile);
        profile_dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        match serde_json::from_str::<serde_json::Value>(&data) {
            Ok(_) => Ok(Some(data)),
            Err(parse_err) => {
                if let Some(backup) = self.load_from_backup(&path) {
                    log::warn!("store key {} unreadable, using backup: {}", key, parse_err);
                    return Ok(Some(backup));
                }
                Err(CacheError::ParseError(parse_err.to_string()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let path = self.file_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::WriteError(e.to_string()))?;
        }
        self.rotate_backups(&path);
        let tmp_path = path.with_extension("json.tmp");
        let file =
            fs::File::create(&tmp_path).map_err(|e| CacheError::WriteError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(value.as_bytes())
            .map_err(|e| CacheError::WriteError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| CacheError::WriteError(e.to_string()))?;
        fs::rename(&tmp_path, &path).map_err(|e| CacheError::WriteError(e.to_string()))?;
        Ok(())
    }
}

pub fn default_storage_root() -> PathBuf {
    diagnostics::data_dir().unwrap_or_else(|| Path::new("/").join(".windowtree"))
}

fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "store".to_string()
    } else {
        out
    }
}
