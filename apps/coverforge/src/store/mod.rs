//! Persistent store adapter.
//!
//! One async key/value contract over two interchangeable backends: a shared
//! in-process map with a change feed (the extension-scoped storage analog)
//! and a JSON file (the page-local storage analog). Callers never learn which
//! backend is active; the backend is chosen once at startup from host
//! capabilities and injected — there is no ambient singleton.
//!
//! Persistence of preferences and drafts is best-effort. Callers of the
//! derived helpers log failures and continue; a storage error never blocks
//! generation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::StoreError;
use crate::model::{DraftState, ExtractedJobData, HistoryEntry, Preferences};

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Flat key namespace shared by every backend.
pub mod keys {
    pub const LANGUAGE: &str = "language";
    pub const TONE: &str = "tone";
    pub const LENGTH: &str = "length";
    pub const DRAFT_JOB_DESCRIPTION: &str = "draftJobDescription";
    pub const DRAFT_COMPANY_NAME: &str = "draftCompanyName";
    pub const DRAFT_JOB_TITLE: &str = "draftJobTitle";
    pub const DRAFT_JOB_LINK: &str = "draftJobLink";
    pub const DRAFT_ADDITIONAL_INSTRUCTIONS: &str = "draftAdditionalInstructions";
    pub const LETTER_HISTORY: &str = "letterHistory";
    pub const EXTRACTED_JOB: &str = "extractedJob";
    pub const EXTRACTED_AT: &str = "extractedAt";
}

/// Maximum number of retained letter-history entries. Oldest entries are
/// evicted first, by insertion order.
pub const HISTORY_CAP: usize = 10;

/// Change notification emitted when a key is written. Only the shared
/// backend publishes these; the file backend's feed never fires.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub key: String,
    pub value: Value,
}

/// The uniform async contract both backends implement.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Merges the given entries into the store.
    async fn save(&self, entries: HashMap<String, Value>) -> Result<(), StoreError>;

    /// Loads the named keys, or everything available when `keys` is `None`.
    /// Absent keys are simply missing from the result, not errors.
    async fn load(&self, keys: Option<&[&str]>) -> Result<HashMap<String, Value>, StoreError>;

    /// Removes the named keys. Removing an absent key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Drops every stored entry.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Change feed for reactive readers.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Handle over the selected backend plus the fixed-shape derived operations.
/// Cheap to clone; every surface controller gets its own copy of the same
/// underlying backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
}

impl Store {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        self.backend.save(entries).await
    }

    pub async fn load(&self, keys: Option<&[&str]>) -> Result<HashMap<String, Value>, StoreError> {
        self.backend.load(keys).await
    }

    pub async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.backend.remove(keys).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.clear().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.backend.subscribe()
    }

    /// Persists the draft subset under its fixed keys.
    pub async fn save_draft(&self, draft: &DraftState) -> Result<(), StoreError> {
        let mut entries = HashMap::new();
        entries.insert(
            keys::DRAFT_JOB_DESCRIPTION.to_string(),
            Value::String(draft.job_description.clone()),
        );
        entries.insert(
            keys::DRAFT_COMPANY_NAME.to_string(),
            Value::String(draft.company_name.clone()),
        );
        entries.insert(
            keys::DRAFT_JOB_TITLE.to_string(),
            Value::String(draft.job_title.clone()),
        );
        entries.insert(
            keys::DRAFT_JOB_LINK.to_string(),
            Value::String(draft.job_link.clone()),
        );
        entries.insert(
            keys::DRAFT_ADDITIONAL_INSTRUCTIONS.to_string(),
            Value::String(draft.additional_instructions.clone()),
        );
        self.backend.save(entries).await
    }

    pub async fn load_draft(&self) -> Result<DraftState, StoreError> {
        let map = self
            .backend
            .load(Some(&[
                keys::DRAFT_JOB_DESCRIPTION,
                keys::DRAFT_COMPANY_NAME,
                keys::DRAFT_JOB_TITLE,
                keys::DRAFT_JOB_LINK,
                keys::DRAFT_ADDITIONAL_INSTRUCTIONS,
            ]))
            .await?;
        Ok(DraftState {
            job_description: string_at(&map, keys::DRAFT_JOB_DESCRIPTION),
            company_name: string_at(&map, keys::DRAFT_COMPANY_NAME),
            job_title: string_at(&map, keys::DRAFT_JOB_TITLE),
            job_link: string_at(&map, keys::DRAFT_JOB_LINK),
            additional_instructions: string_at(&map, keys::DRAFT_ADDITIONAL_INSTRUCTIONS),
        })
    }

    /// Persists {language, tone, length} as three independent keys.
    pub async fn save_preferences(&self, prefs: &Preferences) -> Result<(), StoreError> {
        let mut entries = HashMap::new();
        entries.insert(keys::LANGUAGE.to_string(), serde_json::to_value(prefs.language)?);
        entries.insert(keys::TONE.to_string(), serde_json::to_value(prefs.tone)?);
        entries.insert(keys::LENGTH.to_string(), serde_json::to_value(prefs.length)?);
        self.backend.save(entries).await
    }

    /// Loads preferences, falling back to defaults for absent keys and for
    /// values an older version wrote in a shape we no longer understand.
    pub async fn load_preferences(&self) -> Result<Preferences, StoreError> {
        let map = self
            .backend
            .load(Some(&[keys::LANGUAGE, keys::TONE, keys::LENGTH]))
            .await?;
        Ok(Preferences {
            language: decoded_or_default(&map, keys::LANGUAGE),
            tone: decoded_or_default(&map, keys::TONE),
            length: decoded_or_default(&map, keys::LENGTH),
        })
    }

    /// Prepends a letter to the history and truncates to [`HISTORY_CAP`].
    ///
    /// Read-modify-write, not atomic: the system has at most one writer per
    /// surface instance, and concurrent surfaces sharing one store would
    /// race here.
    pub async fn push_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut history = self.history().await?;
        history.insert(0, entry);
        history.truncate(HISTORY_CAP);

        let mut entries = HashMap::new();
        entries.insert(keys::LETTER_HISTORY.to_string(), serde_json::to_value(&history)?);
        self.backend.save(entries).await
    }

    /// The retained history, newest first. A payload we cannot decode is
    /// treated as empty rather than poisoning the flow.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let map = self.backend.load(Some(&[keys::LETTER_HISTORY])).await?;
        let Some(value) = map.get(keys::LETTER_HISTORY) else {
            return Ok(Vec::new());
        };
        match serde_json::from_value(value.clone()) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!("discarding undecodable letter history: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Job data most recently written by the page-scan collaborator, if any.
    pub async fn extracted_job(&self) -> Result<Option<ExtractedJobData>, StoreError> {
        let map = self.backend.load(Some(&[keys::EXTRACTED_JOB])).await?;
        let Some(value) = map.get(keys::EXTRACTED_JOB) else {
            return Ok(None);
        };
        match serde_json::from_value(value.clone()) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                warn!("ignoring undecodable extracted job payload: {e}");
                Ok(None)
            }
        }
    }
}

fn string_at(map: &HashMap<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn decoded_or_default<T>(map: &HashMap<String, Value>, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    map.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
