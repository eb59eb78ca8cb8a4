//! Services: flow orchestration over webhooks, catalog, tracker and history.
//!
//! DESIGN
//! ======
//! [`Assistant`] is the context object every flow runs against. It owns the
//! outbound clients plus the tracker and history handles, and is cheap to
//! clone so a flow can move into a spawned task.
//!
//! Flows record their own history entries (success or failure). Tracking is
//! layered on top by [`Assistant::run_tracked`] / [`Assistant::spawn_tracked`],
//! which register a search task and settle it with the flow's outcome.

pub mod build;
pub mod offers;

use std::fmt::Debug;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::AppConfig;
use crate::error::{ErrorCode, TaskError};
use crate::history::{HistoryStore, json_safe};
use crate::normalize::NormalizeError;
use crate::storage::{FileStore, KeyValueStore, StorageError};
use crate::tracker::{SearchDescriptor, SearchTracker, TaskId, TaskKind};
use crate::webhook::{WebhookClient, WebhookError};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("catalog backend is not configured")]
    CatalogUnavailable,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("background search failed: {0}")]
    Join(String),
}

impl ErrorCode for AssistantError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Webhook(e) => e.error_code(),
            Self::Normalize(e) => e.error_code(),
            Self::Catalog(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::CatalogUnavailable => "E_CATALOG_UNAVAILABLE",
            Self::EmptyInput(_) => "E_EMPTY_INPUT",
            Self::Join(_) => "E_JOIN",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Webhook(e) => e.retryable(),
            Self::Catalog(e) => e.retryable(),
            Self::Storage(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// KNOWLEDGE LEVEL
// =============================================================================

/// User's self-assessed knowledge; selects the configuration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    /// Game + quality driven build.
    Beginner,
    /// Build around one chosen primary part.
    Intermediate,
    /// Manual four-part selection.
    Advanced,
}

impl KnowledgeLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Task kind registered for this level's flow.
    #[must_use]
    pub fn task_kind(self) -> TaskKind {
        match self {
            Self::Beginner => TaskKind::GameSuggestion,
            Self::Intermediate => TaskKind::ComponentSuggestion,
            Self::Advanced => TaskKind::AdvancedConfig,
        }
    }
}

impl std::fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown knowledge level '{other}' (expected beginner, intermediate or advanced)")),
        }
    }
}

// =============================================================================
// ASSISTANT
// =============================================================================

#[derive(Clone)]
pub struct Assistant {
    webhooks: WebhookClient,
    catalog: Option<CatalogClient>,
    tracker: SearchTracker,
    history: HistoryStore,
}

impl Assistant {
    #[must_use]
    pub fn new(
        webhooks: WebhookClient,
        catalog: Option<CatalogClient>,
        tracker: SearchTracker,
        history: HistoryStore,
    ) -> Self {
        Self { webhooks, catalog, tracker, history }
    }

    /// Wire everything from typed config: file-backed state under the data
    /// directory, reqwest transports, and the catalog when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or an HTTP
    /// client fails to build.
    pub fn from_config(config: &AppConfig) -> Result<Self, AssistantError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let tracker = SearchTracker::load(store.clone());
        let history = HistoryStore::new(store);
        let webhooks = WebhookClient::from_config(config.webhooks.clone(), &config.timeouts)?;
        let catalog = config
            .catalog
            .as_ref()
            .map(|c| CatalogClient::from_config(c, &config.timeouts))
            .transpose()?;
        info!(data_dir = %config.data_dir.display(), catalog = catalog.is_some(), "assistant ready");
        Ok(Self::new(webhooks, catalog, tracker, history))
    }

    #[must_use]
    pub fn tracker(&self) -> &SearchTracker {
        &self.tracker
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// # Errors
    ///
    /// Returns [`AssistantError::CatalogUnavailable`] when no catalog is configured.
    pub fn catalog(&self) -> Result<&CatalogClient, AssistantError> {
        self.catalog
            .as_ref()
            .ok_or(AssistantError::CatalogUnavailable)
    }

    /// Register a search task, await `op`, and settle the task with its outcome.
    ///
    /// # Errors
    ///
    /// Returns whatever `op` returns.
    pub async fn run_tracked<T, F>(&self, descriptor: SearchDescriptor, op: F) -> Result<T, AssistantError>
    where
        T: Serialize + Debug,
        F: Future<Output = Result<T, AssistantError>>,
    {
        let id = self.tracker.add_search(descriptor);
        let result = op.await;
        settle(&self.tracker, &id, &result);
        result
    }

    /// Register a search task and run `op` on the runtime. The task's abort
    /// handle is attached so dismissing the search cancels the work.
    pub fn spawn_tracked<T, F>(
        &self,
        descriptor: SearchDescriptor,
        op: F,
    ) -> (TaskId, JoinHandle<Result<T, AssistantError>>)
    where
        T: Serialize + Debug + Send + 'static,
        F: Future<Output = Result<T, AssistantError>> + Send + 'static,
    {
        let id = self.tracker.add_search(descriptor);
        let tracker = self.tracker.clone();
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let result = op.await;
            settle(&tracker, &task_id, &result);
            result
        });
        self.tracker.attach_abort(&id, handle.abort_handle());
        (id, handle)
    }
}

fn settle<T: Serialize + Debug>(tracker: &SearchTracker, id: &str, result: &Result<T, AssistantError>) {
    match result {
        Ok(value) => tracker.complete_search(id, json_safe(value)),
        Err(e) => tracker.error_search(id, TaskError::from_code(e)),
    }
}

/// Await a spawned search, folding join failures (including cancellation)
/// into [`AssistantError::Join`].
///
/// # Errors
///
/// Returns the flow's own error or the join failure.
pub async fn join_search<T>(handle: JoinHandle<Result<T, AssistantError>>) -> Result<T, AssistantError> {
    handle
        .await
        .map_err(|e| AssistantError::Join(e.to_string()))?
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
