// src/store.rs
use crate::error::{StoreError, StoreResult};
use log;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const KEY_RESERVATIONS: &str = "reservations";
pub const KEY_GUESTHOUSE_STATUS: &str = "guesthouseStatus";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_CONFIRMED_SEED_IDS: &str = "confirmedSeedIds";

/// Durable string-keyed storage. Values are whole JSON documents, always
/// replaced wholesale; there are no partial writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// Reads a key and parses it as JSON. A missing key is `Ok(None)`.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|e| {
                let msg = format!("JSON for key '{}' is invalid: {}", key, e);
                log::error!("get_json: {}", msg);
                StoreError::Deserialization(msg)
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn put_json<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| {
        let msg = format!("Failed to serialize key '{}': {}", key, e);
        log::error!("put_json: {}", msg);
        StoreError::Serialization(msg)
    })?;
    store.set(key, &raw)
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("Read key '{}' from {:?}", key, path);
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                log::error!("Failed to read {:?}: {:?}", path, e);
                Err(StoreError::Io(e))
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                log::error!("Failed to create data directory {:?}: {:?}", self.dir, e);
                StoreError::Io(e)
            })?;
        }
        let path = self.path_for(key);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                log::error!("Failed to open {:?} for writing: {:?}", path, e);
                StoreError::Io(e)
            })?;
        file.write_all(value.as_bytes()).map_err(|e| { log::error!("Failed to write {:?}: {:?}", path, e); e })?;
        log::debug!("Wrote key '{}' to {:?}", key, path);
        Ok(())
    }
}

/// Non-durable store for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
