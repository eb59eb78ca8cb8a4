//! reqwest-backed webhook transport.
//!
//! Thin HTTP wrapper: POST a JSON body, read the text back, and hand it to
//! [`parse_body`], which stays pure for testability.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::WebhookTransport;
use super::types::WebhookError;
use crate::config::Timeouts;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport. The client-wide timeout is the default request
    /// deadline; individual calls may override it.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::HttpClientBuild`] if reqwest cannot build a client.
    pub fn new(timeouts: &Timeouts) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| WebhookError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value, WebhookError> {
        debug!(url, timeout_secs = timeout.as_secs(), "webhook post");

        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| map_send_error(&e, timeout))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| map_send_error(&e, timeout))?;

        parse_body(status, &text)
    }
}

fn map_send_error(err: &reqwest::Error, timeout: Duration) -> WebhookError {
    if err.is_timeout() {
        WebhookError::Timeout { after_secs: timeout.as_secs() }
    } else {
        WebhookError::ApiRequest(err.to_string())
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Turn a status and body into JSON or a typed error.
pub(crate) fn parse_body(status: u16, text: &str) -> Result<Value, WebhookError> {
    if !(200..300).contains(&status) {
        return Err(WebhookError::ApiResponse { status, body: text.to_string() });
    }
    if text.trim().is_empty() {
        return Err(WebhookError::EmptyBody);
    }
    serde_json::from_str(text).map_err(|e| WebhookError::ApiParse(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
