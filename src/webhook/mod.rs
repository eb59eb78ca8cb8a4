//! Webhook client: outbound calls to the automation backend.
//!
//! DESIGN
//! ======
//! [`WebhookTransport`] is the seam: production code posts through
//! [`http::HttpTransport`], tests substitute an in-memory transport. The
//! [`WebhookClient`] owns the endpoint URLs and builds each request body,
//! returning the raw JSON so the normalizer can interpret it.
//!
//! Every webhook call uses the extended webhook timeout.

pub mod http;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::config::{Timeouts, WebhookUrls};
use crate::normalize::{Category, SuggestedComponent};
pub use types::{ComponentSuggestionRequest, Envelope, GameRequest, PcConfigRequest, PriceTier, Quality, WebhookError};

/// `source` value sent with PC-config submissions.
pub const SOURCE_PC_BUILDER: &str = "pc-builder";
/// `source` value sent with quick searches.
pub const SOURCE_QUICK_SEARCH: &str = "quick-search";

// =============================================================================
// TRANSPORT
// =============================================================================

/// POST a JSON body and decode the JSON answer.
#[async_trait::async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value, WebhookError>;
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct WebhookClient {
    transport: Arc<dyn WebhookTransport>,
    urls: WebhookUrls,
    timeout: Duration,
}

impl WebhookClient {
    #[must_use]
    pub fn new(transport: Arc<dyn WebhookTransport>, urls: WebhookUrls, timeouts: &Timeouts) -> Self {
        Self { transport, urls, timeout: timeouts.webhook() }
    }

    /// Build a client over the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::HttpClientBuild`] if the HTTP client fails.
    pub fn from_config(urls: WebhookUrls, timeouts: &Timeouts) -> Result<Self, WebhookError> {
        let transport = http::HttpTransport::new(timeouts)?;
        Ok(Self::new(Arc::new(transport), urls, timeouts))
    }

    /// Submit a manual four-part selection for pricing.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn submit_pc_config(&self, request: &PcConfigRequest) -> Result<Value, WebhookError> {
        let body = envelope(SOURCE_PC_BUILDER, request)?;
        self.post("pc_config", &self.urls.pc_config, &body).await
    }

    /// Ask for parts that complement a primary component.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn suggest_components(&self, primary_component: &str) -> Result<Value, WebhookError> {
        let body = to_body(&ComponentSuggestionRequest { primary_component })?;
        self.post("component_suggestion", &self.urls.component_suggestion, &body)
            .await
    }

    /// Ask for a build that runs a game at the requested quality.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn suggest_for_game(&self, request: &GameRequest) -> Result<Value, WebhookError> {
        let body = to_body(request)?;
        self.post("game_suggestion", &self.urls.game_suggestion, &body)
            .await
    }

    /// Price a list of suggested components. The body is the bare array.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn price_search(&self, tier: PriceTier, components: &[SuggestedComponent]) -> Result<Value, WebhookError> {
        let body = to_body(&components)?;
        let (name, url) = match tier {
            PriceTier::Beginner => ("beginner_price", &self.urls.beginner_price),
            PriceTier::Intermediate => ("intermediate_price", &self.urls.intermediate_price),
        };
        self.post(name, url, &body).await
    }

    /// Price a single named part within one category.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn quick_search(&self, category: Category, name: &str) -> Result<Value, WebhookError> {
        let mut data = serde_json::Map::new();
        data.insert(category.as_str().to_string(), Value::String(name.to_string()));
        let body = envelope(SOURCE_QUICK_SEARCH, &data)?;
        self.post("quick_search", &self.urls.quick_search, &body)
            .await
    }

    async fn post(&self, endpoint: &'static str, url: &str, body: &Value) -> Result<Value, WebhookError> {
        let started = std::time::Instant::now();
        let result = self.transport.post_json(url, body, self.timeout).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(_) => info!(endpoint, elapsed_ms, "webhook call succeeded"),
            Err(e) => warn!(endpoint, elapsed_ms, error = %e, "webhook call failed"),
        }
        result
    }
}

// =============================================================================
// BODIES
// =============================================================================

fn to_body<T: Serialize + ?Sized>(value: &T) -> Result<Value, WebhookError> {
    serde_json::to_value(value).map_err(|e| WebhookError::Encode(e.to_string()))
}

fn envelope<T: Serialize>(source: &str, data: &T) -> Result<Value, WebhookError> {
    to_body(&Envelope { source, timestamp: now_rfc3339(), data })
}

pub(crate) fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
