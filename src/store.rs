// Persisted key/value settings store.
//
// Every dashboard preference is a string under a string key, read and
// written synchronously. Handles are cheap clones over one shared map, so a
// section callback can hold its own handle and write through it; the last
// writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, StoreError};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

type Entries = BTreeMap<String, String>;

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store that lives only as long as the process. Used by tests and by
/// previews that must not touch the user's saved layout.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.entries).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.entries).remove(key);
    }
}

/// Store persisted as one pretty-printed JSON object.
///
/// Each mutation rewrites the whole file. A failed write is logged and the
/// in-memory value stays authoritative until the next successful flush.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    entries: Arc<Mutex<Entries>>,
    path: Arc<PathBuf>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt file is reported and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Store] Failed to parse {:?}: {}, starting empty", path, e);
                    Entries::new()
                }),
                Err(e) => {
                    log::warn!("[Store] Failed to read {:?}: {}, starting empty", path, e);
                    Entries::new()
                }
            }
        } else {
            Entries::new()
        };

        log::info!("[Store] Opened {:?} with {} keys", path, entries.len());

        Self {
            entries: Arc::new(Mutex::new(entries)),
            path: Arc::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current map to disk: tmp file first, then rename, so a
    /// crash never leaves a half-written store.
    pub fn flush(&self) -> Result<()> {
        let entries = lock(&self.entries);
        write_atomic(&self.path, &entries)
    }

    fn persist(&self, entries: &Entries) {
        if let Err(e) = write_atomic(&self.path, entries) {
            log::error!("[Store] Failed to write {:?}: {}", self.path, e);
        }
    }
}

fn write_atomic(path: &Path, entries: &Entries) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::NoParent(path.display().to_string()))?;
    fs::create_dir_all(parent)?;

    let json = serde_json::to_string_pretty(entries)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = lock(&self.entries);
        if entries.get(key).map(String::as_str) == Some(value) {
            return;
        }
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
