//! History store: capped, persisted log of past requests.
//!
//! DESIGN
//! ======
//! The whole log is one JSON array under `history.v1`, newest entry first.
//! Each add rewrites the array truncated to [`MAX_ENTRIES`]. Reads never
//! fail: a missing or corrupt blob is an empty log.
//!
//! Payloads enter through [`json_safe`], which always produces a JSON value
//! so one unencodable payload cannot block persistence of the rest.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::TaskError;
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

/// Persistence key of the history log.
pub const STORAGE_KEY: &str = "history.v1";

/// Entries kept; older ones are evicted.
pub const MAX_ENTRIES: usize = 200;

/// Longest debug text accepted as a fallback encoding.
const MAX_DEBUG_LEN: usize = 64 * 1024;

const UNSERIALIZABLE_MESSAGE: &str = "content not serializable";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistorySource {
    PcBuilder,
    QuickSearch,
    GameAi,
}

impl HistorySource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PcBuilder => "pc-builder",
            Self::QuickSearch => "quick-search",
            Self::GameAi => "game-ai",
        }
    }
}

impl std::fmt::Display for HistorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub source: HistorySource,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub request: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl HistoryEntry {
    /// Whether the recorded response is an error marker.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(|r| r.get("error").is_some())
    }
}

/// Entry fields supplied by the caller; id and (by default) timestamp are
/// assigned on [`HistoryStore::add`].
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub source: HistorySource,
    pub title: String,
    pub subtitle: Option<String>,
    pub request: Value,
    pub response: Option<Value>,
    pub timestamp: Option<OffsetDateTime>,
}

impl NewHistoryEntry {
    pub fn new(source: HistorySource, title: impl Into<String>) -> Self {
        Self { source, title: title.into(), subtitle: None, request: Value::Null, response: None, timestamp: None }
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into();
        self.subtitle = (!subtitle.is_empty()).then_some(subtitle);
        self
    }

    #[must_use]
    pub fn request<T: Serialize + Debug + ?Sized>(mut self, request: &T) -> Self {
        self.request = json_safe(request);
        self
    }

    #[must_use]
    pub fn response<T: Serialize + Debug + ?Sized>(mut self, response: &T) -> Self {
        self.response = Some(json_safe(response));
        self
    }

    /// Record a failure as `{"error": message}`.
    #[must_use]
    pub fn failed(mut self, error: &TaskError) -> Self {
        self.response = Some(error.history_marker());
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Prepend an entry, evict beyond [`MAX_ENTRIES`], persist. A failed write
    /// is logged; the entry is still returned.
    pub fn add(&self, new: NewHistoryEntry) -> HistoryEntry {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            source: new.source,
            timestamp: new.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
            title: new.title,
            subtitle: new.subtitle,
            request: new.request,
            response: new.response,
        };

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut all = self.read_all();
        all.insert(0, entry.clone());
        all.truncate(MAX_ENTRIES);
        if let Err(e) = save_json(self.store.as_ref(), STORAGE_KEY, &all) {
            warn!(entry_id = %entry.id, error = %e, "failed to persist history");
        }
        debug!(entry_id = %entry.id, source = %entry.source, count = all.len(), "history entry added");
        entry
    }

    /// Entries newest-first by timestamp; ties keep stored order.
    #[must_use]
    pub fn list(&self) -> Vec<HistoryEntry> {
        let mut all = self.read_all();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<HistoryEntry> {
        self.read_all().into_iter().find(|e| e.id == id)
    }

    /// Empty the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        save_json(self.store.as_ref(), STORAGE_KEY, &Vec::<HistoryEntry>::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_all().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_all(&self) -> Vec<HistoryEntry> {
        load_json(self.store.as_ref(), STORAGE_KEY).unwrap_or_default()
    }
}

// =============================================================================
// BEST-EFFORT ENCODING
// =============================================================================

/// Encode any payload as JSON: directly when possible, else as its debug
/// text (bounded), else a fixed placeholder.
pub fn json_safe<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            let text = format!("{value:?}");
            if !text.is_empty() && text.len() <= MAX_DEBUG_LEN {
                debug!(error = %e, "payload stored as debug text");
                Value::String(text)
            } else {
                warn!(error = %e, "payload not serializable");
                unserializable_placeholder()
            }
        }
    }
}

#[must_use]
pub fn unserializable_placeholder() -> Value {
    json!({ "message": UNSERIALIZABLE_MESSAGE })
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
