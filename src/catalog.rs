//! Catalog client: passive reads from the hosted component tables.
//!
//! DESIGN
//! ======
//! The table store speaks plain REST: `GET {url}/rest/v1/{table}` with an
//! `apikey` header and PostgREST-style query parameters. [`CatalogTransport`]
//! isolates that wire so the lookup logic ([`CatalogClient`]) is tested
//! against canned rows.
//!
//! Row columns use the store's own names (`nome`, `preco`, `marca`, ...);
//! English fallbacks are accepted as well.
//!
//! Lookups that fan out over several tables degrade per table: a failing
//! table is logged and contributes no rows.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{CatalogConfig, Timeouts};
use crate::normalize::Category;

/// Shown when a row carries no usable name.
pub const UNNAMED: &str = "Unnamed";

/// Minimum trimmed length of a cross-table search term.
pub const MIN_TERM_LEN: usize = 2;

/// Default number of search suggestions.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Every searchable table, in query order.
pub const SEARCH_ORDER: [Category; 5] =
    [Category::Cpu, Category::Gpu, Category::Motherboard, Category::Ram, Category::Storage];

/// Tables included in the full hardware listing.
pub const LISTING_ORDER: [Category; 4] = [Category::Cpu, Category::Gpu, Category::Motherboard, Category::Ram];

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("catalog request timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("catalog request failed: {0}")]
    ApiRequest(String),

    #[error("catalog response error: status {status}")]
    ApiResponse { status: u16, body: String },

    #[error("catalog response parse failed: {0}")]
    ApiParse(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl crate::error::ErrorCode for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::InvalidUrl(_) => "E_CATALOG_URL",
            Self::Timeout { .. } => "E_TIMEOUT",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::UnknownCategory(_) => "E_UNKNOWN_CATEGORY",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::Timeout { .. } | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Remote table holding one category.
#[must_use]
pub fn table_name(category: Category) -> &'static str {
    match category {
        Category::Cpu => "Cpus",
        Category::Gpu => "Video Cards",
        Category::Motherboard => "Motherboards",
        Category::Ram => "Rams",
        Category::Storage => "Storages",
    }
}

/// One catalog row in unified form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CatalogItem {
    /// Map a raw table row. Non-object rows are rejected.
    #[must_use]
    pub fn from_row(category: Category, row: &Value) -> Option<Self> {
        let obj = row.as_object()?;
        let price = ["preco", "price"].iter().find_map(|k| match obj.get(*k)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        });

        Some(Self {
            id: row_text(obj, &["id"]).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: row_text(obj, &["nome", "name"]).unwrap_or_else(|| UNNAMED.to_string()),
            category,
            price: price.filter(|p| p.is_finite()),
            specifications: row_text(obj, &["especificacoes", "specifications"]),
            brand: row_text(obj, &["marca", "brand"]),
            model: row_text(obj, &["modelo", "model"]),
        })
    }
}

fn row_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        v @ (Value::Object(_) | Value::Array(_)) => Some(v.to_string()),
        _ => None,
    })
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Fetch the rows of one table with the given query parameters.
#[async_trait::async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn fetch_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>, CatalogError>;
}

pub struct HttpCatalogTransport {
    http: reqwest::Client,
    base: reqwest::Url,
    api_key: String,
    timeout_secs: u64,
}

impl HttpCatalogTransport {
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client fails to build.
    pub fn new(config: &CatalogConfig, timeouts: &Timeouts) -> Result<Self, CatalogError> {
        let base = reqwest::Url::parse(&config.url).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(config.url.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| CatalogError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base, api_key: config.api_key.clone(), timeout_secs: timeouts.request_secs })
    }

    fn table_url(&self, table: &str) -> Result<reqwest::Url, CatalogError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        Ok(url)
    }

    fn map_send_error(&self, err: &reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout { after_secs: self.timeout_secs }
        } else {
            CatalogError::ApiRequest(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl CatalogTransport for HttpCatalogTransport {
    async fn fetch_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>, CatalogError> {
        let url = self.table_url(table)?;
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        parse_rows(status, &text)
    }
}

pub(crate) fn parse_rows(status: u16, text: &str) -> Result<Vec<Value>, CatalogError> {
    if !(200..300).contains(&status) {
        return Err(CatalogError::ApiResponse { status, body: text.to_string() });
    }
    serde_json::from_str(text).map_err(|e| CatalogError::ApiParse(e.to_string()))
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct CatalogClient {
    transport: Arc<dyn CatalogTransport>,
}

impl CatalogClient {
    #[must_use]
    pub fn new(transport: Arc<dyn CatalogTransport>) -> Self {
        Self { transport }
    }

    /// Build a client over the reqwest transport.
    ///
    /// # Errors
    ///
    /// See [`HttpCatalogTransport::new`].
    pub fn from_config(config: &CatalogConfig, timeouts: &Timeouts) -> Result<Self, CatalogError> {
        Ok(Self::new(Arc::new(HttpCatalogTransport::new(config, timeouts)?)))
    }

    /// Names available in one category, in table order.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_names(&self, category: Category) -> Result<Vec<String>, CatalogError> {
        let rows = self
            .transport
            .fetch_rows(table_name(category), &[("select", "nome".to_string())])
            .await?;
        let names: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("nome").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        debug!(%category, count = names.len(), "catalog names loaded");
        Ok(names)
    }

    /// Rows of one table whose name, brand or model contains `term`
    /// (case-insensitive). Failures yield no rows.
    pub async fn search_table(&self, category: Category, term: &str) -> Vec<CatalogItem> {
        let pattern = sanitize_term(term);
        let filter = format!("(nome.ilike.*{pattern}*,marca.ilike.*{pattern}*,modelo.ilike.*{pattern}*)");
        self.rows_or_empty(category, &[("select", "*".to_string()), ("or", filter)])
            .await
    }

    /// Search every table concurrently. Terms shorter than two characters
    /// return nothing. Name matches rank first, then rows sort by type label.
    pub async fn quick_search(&self, term: &str) -> Vec<CatalogItem> {
        let term = term.trim();
        if term.chars().count() < MIN_TERM_LEN {
            return Vec::new();
        }

        let results = join_all(SEARCH_ORDER.map(|category| self.search_table(category, term))).await;
        let mut items: Vec<CatalogItem> = results.into_iter().flatten().collect();
        rank_by_relevance(&mut items, term);
        items
    }

    /// Unique names from [`Self::quick_search`], at most `limit`.
    pub async fn suggestions(&self, term: &str, limit: usize) -> Vec<String> {
        let items = self.quick_search(term).await;
        let mut names: Vec<String> = Vec::new();
        for item in items {
            if names.len() == limit {
                break;
            }
            if !names.contains(&item.name) {
                names.push(item.name);
            }
        }
        names
    }

    /// Search the table behind a type label such as `"GPU"`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCategory`] when no table carries that label.
    pub async fn search_by_category(&self, term: &str, label: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let category = SEARCH_ORDER
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| CatalogError::UnknownCategory(label.to_string()))?;
        Ok(self.search_table(category, term).await)
    }

    /// Every row of the four core tables, sorted by type label then name.
    pub async fn all_hardware(&self) -> Vec<CatalogItem> {
        let query = [("select", "*".to_string())];
        let results = join_all(LISTING_ORDER.map(|category| self.rows_or_empty(category, &query))).await;
        let mut items: Vec<CatalogItem> = results.into_iter().flatten().collect();
        items.sort_by(|a, b| {
            type_key(a.category)
                .cmp(&type_key(b.category))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        items
    }

    async fn rows_or_empty(&self, category: Category, query: &[(&str, String)]) -> Vec<CatalogItem> {
        let table = table_name(category);
        match self.transport.fetch_rows(table, query).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| CatalogItem::from_row(category, row))
                .collect(),
            Err(e) => {
                warn!(table, error = %e, "catalog table lookup failed");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// LOCAL HELPERS
// =============================================================================

/// Names containing `term` (case-insensitive); a blank term keeps everything.
#[must_use]
pub fn filter_list<'a>(list: &'a [String], term: &str) -> Vec<&'a str> {
    let needle = term.trim().to_lowercase();
    list.iter()
        .map(String::as_str)
        .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
        .collect()
}

/// Stable relevance order: rows whose name contains the term come first;
/// ties sort by type label.
pub fn rank_by_relevance(items: &mut [CatalogItem], term: &str) {
    let needle = term.to_lowercase();
    items.sort_by_cached_key(|item| (!item.name.to_lowercase().contains(&needle), type_key(item.category)));
}

fn type_key(category: Category) -> String {
    category.label().to_lowercase()
}

/// Characters that would break the `or=(...)` filter syntax are dropped.
fn sanitize_term(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
        .collect()
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Transport serving fixed rows per table and recording queries.
    #[derive(Default)]
    pub struct MockCatalog {
        tables: Mutex<HashMap<String, Result<Vec<Value>, u16>>>,
        queries: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockCatalog {
        pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
            self.tables.lock().unwrap().insert(table.to_string(), Ok(rows));
            self
        }

        pub fn with_failure(self, table: &str, status: u16) -> Self {
            self.tables.lock().unwrap().insert(table.to_string(), Err(status));
            self
        }

        pub fn queries(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CatalogTransport for MockCatalog {
        async fn fetch_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>, CatalogError> {
            self.queries.lock().unwrap().push((
                table.to_string(),
                query.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect(),
            ));
            match self.tables.lock().unwrap().get(table) {
                Some(Ok(rows)) => Ok(rows.clone()),
                Some(Err(status)) => Err(CatalogError::ApiResponse { status: *status, body: String::new() }),
                None => Ok(Vec::new()),
            }
        }
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
