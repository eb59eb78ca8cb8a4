//! Error codes shared by every fallible layer.
//!
//! DESIGN
//! ======
//! Each module owns its own `thiserror` enum. They all implement
//! [`ErrorCode`] so the tracker and the history log can record a failure
//! as a grepable code plus a retryable flag without knowing its origin.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for recorded failures.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TASK ERROR
// =============================================================================

/// Serializable snapshot of a failure, stored on errored search tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub retryable: bool,
}

impl TaskError {
    /// Build a task error from a plain message with an explicit code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), retryable: false }
    }

    /// Capture any [`ErrorCode`] implementor.
    pub fn from_code<E: ErrorCode + ?Sized>(err: &E) -> Self {
        Self { code: err.error_code().to_string(), message: err.to_string(), retryable: err.retryable() }
    }

    /// The `{"error": message}` marker written into history responses.
    #[must_use]
    pub fn history_marker(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.message, "code": self.code })
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
