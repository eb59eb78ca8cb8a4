//! Search task tracker: registry of in-flight and finished requests.
//!
//! DESIGN
//! ======
//! A cloneable handle over `Arc<Mutex<Inner>>`. Each task moves out of
//! `Pending` at most once; the terminal state carries either the result or the
//! error, never both. Completion and error callbacks are `FnOnce` boxes kept
//! beside the persisted record and run after the lock is released, so they may
//! call back into the tracker.
//!
//! Every mutation rewrites the whole registry under `searches.ongoing`.
//! Restored tasks come back without callbacks and stay until dismissed.
//!
//! Removing a task drops its callbacks and aborts the spawned operation
//! attached to it, so a late result for a removed id is ignored.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::error::TaskError;
use crate::storage::{KeyValueStore, load_json, save_json};

/// Persistence key of the task registry.
pub const STORAGE_KEY: &str = "searches.ongoing";

const EVENT_CAPACITY: usize = 64;

pub type TaskId = String;
pub type CompleteCallback = Box<dyn FnOnce(&Value) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(&TaskError) + Send>;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    ComponentSuggestion,
    GameSuggestion,
    QuickSearch,
    AdvancedConfig,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComponentSuggestion => "component-suggestion",
            Self::GameSuggestion => "game-suggestion",
            Self::QuickSearch => "quick-search",
            Self::AdvancedConfig => "advanced-config",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Completed { result: Value },
    Errored { error: TaskError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTask {
    pub id: TaskId,
    pub kind: TaskKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub start_time: i64,
    pub state: TaskState,
}

impl SearchTask {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, TaskState::Pending)
    }

    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.state {
            TaskState::Completed { result } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&TaskError> {
        match &self.state {
            TaskState::Errored { error } => Some(error),
            _ => None,
        }
    }

    /// Time since the task started, as `"42s"` or `"3m 5s"`.
    #[must_use]
    pub fn elapsed_label(&self, now_ms: i64) -> String {
        elapsed_label(self.start_time, now_ms)
    }
}

/// What a caller supplies when registering a task.
pub struct SearchDescriptor {
    pub kind: TaskKind,
    pub title: String,
    pub subtitle: Option<String>,
    on_complete: Option<CompleteCallback>,
    on_error: Option<ErrorCallback>,
}

impl SearchDescriptor {
    pub fn new(kind: TaskKind, title: impl Into<String>) -> Self {
        Self { kind, title: title.into(), subtitle: None, on_complete: None, on_error: None }
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into();
        self.subtitle = (!subtitle.is_empty()).then_some(subtitle);
        self
    }

    #[must_use]
    pub fn on_complete(mut self, f: impl FnOnce(&Value) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(&TaskError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

/// Change notifications delivered to [`SearchTracker::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Added(SearchTask),
    Completed(SearchTask),
    Errored(SearchTask),
    Removed(TaskId),
}

// =============================================================================
// TRACKER
// =============================================================================

struct Entry {
    task: SearchTask,
    on_complete: Option<CompleteCallback>,
    on_error: Option<ErrorCallback>,
    abort: Option<AbortHandle>,
}

impl Entry {
    fn restored(task: SearchTask) -> Self {
        Self { task, on_complete: None, on_error: None, abort: None }
    }
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
}

impl Inner {
    fn find_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.task.id == id)
    }
}

#[derive(Clone)]
pub struct SearchTracker {
    inner: Arc<Mutex<Inner>>,
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<TrackerEvent>,
}

impl SearchTracker {
    /// Empty tracker persisting through `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { inner: Arc::new(Mutex::new(Inner::default())), store, events }
    }

    /// Tracker restored from the registry persisted in `store`. A missing or
    /// corrupt registry starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let tasks: Vec<SearchTask> = load_json(store.as_ref(), STORAGE_KEY).unwrap_or_default();
        debug!(count = tasks.len(), "search registry restored");
        let tracker = Self::new(store);
        tracker.lock().entries = tasks.into_iter().map(Entry::restored).collect();
        tracker
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a pending task and return its id.
    pub fn add_search(&self, descriptor: SearchDescriptor) -> TaskId {
        let task = SearchTask {
            id: uuid::Uuid::new_v4().to_string(),
            kind: descriptor.kind,
            title: descriptor.title,
            subtitle: descriptor.subtitle,
            start_time: now_ms(),
            state: TaskState::Pending,
        };
        let id = task.id.clone();
        info!(task_id = %id, kind = %task.kind, "search added");

        {
            let mut inner = self.lock();
            inner.entries.push(Entry {
                task: task.clone(),
                on_complete: descriptor.on_complete,
                on_error: descriptor.on_error,
                abort: None,
            });
            self.persist(&inner);
        }

        let _ = self.events.send(TrackerEvent::Added(task));
        id
    }

    /// Attach the handle of the spawned operation. Returns `false` (and aborts
    /// the operation) when the task is gone or already finished.
    pub fn attach_abort(&self, id: &str, handle: AbortHandle) -> bool {
        let mut inner = self.lock();
        match inner.find_mut(id) {
            Some(entry) if entry.task.is_pending() => {
                entry.abort = Some(handle);
                true
            }
            Some(_) => false,
            None => {
                handle.abort();
                false
            }
        }
    }

    /// Mark a pending task completed and run its completion callback.
    /// Unknown ids and finished tasks are ignored.
    pub fn complete_search(&self, id: &str, result: Value) {
        let (callback, snapshot) = {
            let mut inner = self.lock();
            let Some(entry) = inner.find_mut(id) else {
                debug!(task_id = %id, "complete for unknown search ignored");
                return;
            };
            if !entry.task.is_pending() {
                warn!(task_id = %id, "complete for finished search ignored");
                return;
            }
            entry.task.state = TaskState::Completed { result };
            entry.on_error = None;
            entry.abort = None;
            let callback = entry.on_complete.take();
            let snapshot = entry.task.clone();
            self.persist(&inner);
            (callback, snapshot)
        };

        info!(task_id = %id, "search completed");
        if let (Some(callback), Some(result)) = (callback, snapshot.result()) {
            callback(result);
        }
        let _ = self.events.send(TrackerEvent::Completed(snapshot));
    }

    /// Mark a pending task errored and run its error callback.
    /// Unknown ids and finished tasks are ignored.
    pub fn error_search(&self, id: &str, error: TaskError) {
        let (callback, snapshot) = {
            let mut inner = self.lock();
            let Some(entry) = inner.find_mut(id) else {
                debug!(task_id = %id, "error for unknown search ignored");
                return;
            };
            if !entry.task.is_pending() {
                warn!(task_id = %id, "error for finished search ignored");
                return;
            }
            entry.task.state = TaskState::Errored { error };
            entry.on_complete = None;
            entry.abort = None;
            let callback = entry.on_error.take();
            let snapshot = entry.task.clone();
            self.persist(&inner);
            (callback, snapshot)
        };

        info!(task_id = %id, "search errored");
        if let (Some(callback), Some(error)) = (callback, snapshot.error()) {
            callback(error);
        }
        let _ = self.events.send(TrackerEvent::Errored(snapshot));
    }

    /// Delete a task in any state. Returns whether it existed.
    pub fn remove_search(&self, id: &str) -> bool {
        let removed = {
            let mut inner = self.lock();
            let Some(pos) = inner.entries.iter().position(|e| e.task.id == id) else {
                return false;
            };
            let entry = inner.entries.remove(pos);
            self.persist(&inner);
            entry
        };

        if let Some(handle) = removed.abort {
            handle.abort();
        }
        info!(task_id = %id, "search removed");
        let _ = self.events.send(TrackerEvent::Removed(id.to_string()));
        true
    }

    #[must_use]
    pub fn get_search_by_id(&self, id: &str) -> Option<SearchTask> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.task.id == id)
            .map(|e| e.task.clone())
    }

    /// All tasks in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<SearchTask> {
        self.lock()
            .entries
            .iter()
            .map(|e| e.task.clone())
            .collect()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.task.is_pending())
            .count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    fn persist(&self, inner: &Inner) {
        let tasks: Vec<&SearchTask> = inner.entries.iter().map(|e| &e.task).collect();
        if let Err(e) = save_json(self.store.as_ref(), STORAGE_KEY, &tasks) {
            warn!(error = %e, "failed to persist search registry");
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Elapsed time between two epoch-millisecond instants, as `"Ns"` below a
/// minute and `"Mm Ss"` from there on.
#[must_use]
pub fn elapsed_label(start_ms: i64, now_ms: i64) -> String {
    let seconds = now_ms.saturating_sub(start_ms).max(0) / 1000;
    let minutes = seconds / 60;
    if minutes > 0 { format!("{minutes}m {}s", seconds % 60) } else { format!("{seconds}s") }
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tests;
