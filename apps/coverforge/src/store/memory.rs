//! Shared in-process backend — the extension-scoped storage analog.
//!
//! One instance is shared by every surface running in the process (popup and
//! side panel see the same map, and so does the external page-scan
//! collaborator). Writes are published on a broadcast channel so reactive
//! readers observe them without polling.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::error::StoreError;
use crate::store::{StoreBackend, StoreChange};

/// Buffered change events per receiver; slow readers see a lag error rather
/// than blocking writers.
const CHANGE_BUFFER: usize = 32;

pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn save(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        let mut map = self.entries.lock().await;
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
            // No receivers is fine — nobody is listening yet.
            let _ = self.changes.send(StoreChange { key, value });
        }
        Ok(())
    }

    async fn load(&self, keys: Option<&[&str]>) -> Result<HashMap<String, Value>, StoreError> {
        let map = self.entries.lock().await;
        match keys {
            None => Ok(map.clone()),
            Some(keys) => Ok(keys
                .iter()
                .filter_map(|&k| map.get(k).map(|v| (k.to_string(), v.clone())))
                .collect()),
        }
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.entries.lock().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
