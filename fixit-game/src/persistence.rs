//! Best-effort persistence of the progression record.
//!
//! The storage medium sits behind [`KeyValueStore`]; [`ProgressionRepository`]
//! turns every failure into a logged warning so callers never see one.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::progression::ProgressionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage key `{0}` is not a valid file name")]
    InvalidKey(String),
    #[error("storage is unavailable")]
    Unavailable,
    #[error("i/o error for key `{key}`")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// String key-value storage capability, modelled on browser local storage.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the key cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set`/`remove` calls fail, as a full or disabled store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable);
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable);
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
            && !key.starts_with('.');
        if valid {
            Ok(self.dir.join(format!("{key}.json")))
        } else {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key)(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(io_error(key))?;
        // Keys never start with a dot, so the staging file cannot shadow one.
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&staging, value).map_err(io_error(key))?;
        fs::rename(&staging, path).map_err(io_error(key))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)?) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(io_error(key)(err)),
            _ => Ok(()),
        }
    }
}

/// Loads and saves the progression record under one storage key.
#[derive(Debug, Clone)]
pub struct ProgressionRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ProgressionRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored record, or `None` when it is absent or unreadable.
    #[must_use]
    pub fn load(&self) -> Option<ProgressionRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("failed to read progression `{}`: {err}", self.key);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("discarding corrupt progression `{}`: {err}", self.key);
                None
            }
        }
    }

    /// Persist `record`. Returns whether the write succeeded.
    pub fn save(&self, record: &ProgressionRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to encode progression: {err}");
                return false;
            }
        };
        match self.store.set(&self.key, &json) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to save progression `{}`: {err}", self.key);
                false
            }
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(&self.key) {
            log::warn!("failed to clear progression `{}`: {err}", self.key);
        }
    }
}
