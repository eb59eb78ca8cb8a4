//! Webhook request types and errors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by webhook calls.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request did not finish within its deadline.
    #[error("request timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    /// The HTTP request failed before a response arrived.
    #[error("webhook request failed: {0}")]
    ApiRequest(String),

    /// The webhook returned a non-success HTTP status.
    #[error("webhook response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The webhook answered with an empty body.
    #[error("webhook returned an empty body")]
    EmptyBody,

    /// The response body is not valid JSON.
    #[error("webhook response parse failed: {0}")]
    ApiParse(String),

    /// The request body could not be encoded.
    #[error("webhook request encode failed: {0}")]
    Encode(String),
}

impl crate::error::ErrorCode for WebhookError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Timeout { .. } => "E_TIMEOUT",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::EmptyBody => "E_EMPTY_BODY",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::Encode(_) => "E_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::Timeout { .. } | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Target quality for game-based suggestions. External contract with the
/// suggestion webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "minimum")]
    Minimum,
    #[serde(rename = "recommended")]
    Recommended,
    #[serde(rename = "high-60fps")]
    High60Fps,
    #[serde(rename = "high-100fps")]
    High100Fps,
}

impl Quality {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Recommended => "recommended",
            Self::High60Fps => "high-60fps",
            Self::High100Fps => "high-100fps",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Minimum => "Minimum",
            Self::Recommended => "Recommended",
            Self::High60Fps => "High + 60 FPS",
            Self::High100Fps => "High + 100+ FPS",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimum" => Ok(Self::Minimum),
            "recommended" => Ok(Self::Recommended),
            "high-60fps" => Ok(Self::High60Fps),
            "high-100fps" => Ok(Self::High100Fps),
            other => Err(format!(
                "unknown quality '{other}' (expected minimum, recommended, high-60fps or high-100fps)"
            )),
        }
    }
}

/// Which price-search automation to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    Beginner,
    Intermediate,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Manual selection submitted to the PC-config webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcConfigRequest {
    pub gpu: String,
    pub cpu: String,
    pub motherboard: String,
    pub ram: String,
    pub consider_reviews: bool,
}

impl PcConfigRequest {
    /// Selected names joined by `" | "`, blanks skipped.
    #[must_use]
    pub fn subtitle(&self) -> String {
        [&self.cpu, &self.gpu, &self.motherboard, &self.ram]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// `{source, timestamp, data}` wrapper used by the PC-config and
/// quick-search webhooks.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub source: &'a str,
    pub timestamp: String,
    pub data: &'a T,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSuggestionRequest<'a> {
    pub primary_component: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRequest {
    pub game: String,
    pub quality: Quality,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
