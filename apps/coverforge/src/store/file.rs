//! JSON-file backend — the page-local storage analog.
//!
//! A single file holds a map of key → JSON-encoded string. Values are
//! encoded on write and decoded on read, with a raw-string fallback for
//! values that do not parse (older versions wrote some keys unencoded).
//! I/O is synchronous underneath but presented through the same async
//! contract as every other backend.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::store::{StoreBackend, StoreChange};

pub struct FileBackend {
    path: PathBuf,
    // Kept only so `subscribe` can hand out receivers; this backend has no
    // external writers, so the feed never fires.
    changes: broadcast::Sender<StoreChange>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(1);
        Self {
            path: path.into(),
            changes,
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(map)?)?;
        Ok(())
    }
}

/// Decodes a stored value, keeping it as a raw string when it is not JSON.
fn decode_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl StoreBackend for FileBackend {
    async fn save(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        let mut map = self.read_all()?;
        for (key, value) in entries {
            map.insert(key, serde_json::to_string(&value)?);
        }
        self.write_all(&map)
    }

    async fn load(&self, keys: Option<&[&str]>) -> Result<HashMap<String, Value>, StoreError> {
        let map = self.read_all()?;
        match keys {
            None => Ok(map
                .into_iter()
                .map(|(k, v)| (k, decode_value(&v)))
                .collect()),
            Some(keys) => Ok(keys
                .iter()
                .filter_map(|&k| map.get(k).map(|v| (k.to_string(), decode_value(v))))
                .collect()),
        }
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.read_all()?;
        for key in keys {
            map.remove(*key);
        }
        self.write_all(&map)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.write_all(&HashMap::new())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
