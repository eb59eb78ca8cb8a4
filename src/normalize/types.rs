//! Canonical hardware types produced by the normalizer.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// CATEGORY
// =============================================================================

/// Component category. The first four form the canonical result set;
/// `Storage` only appears in catalog lookups and quick-search offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gpu,
    Cpu,
    Motherboard,
    Ram,
    Storage,
}

impl Category {
    /// Categories of the canonical `{gpu, cpu, motherboard, ram}` result set.
    pub const CANONICAL: [Category; 4] = [Self::Gpu, Self::Cpu, Self::Motherboard, Self::Ram];

    /// Probe order used when a quick-search payload names a single category.
    pub const QUICK_SEARCH_ORDER: [Category; 5] = [Self::Cpu, Self::Gpu, Self::Motherboard, Self::Ram, Self::Storage];

    /// Payload key, e.g. `"gpu"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
            Self::Motherboard => "motherboard",
            Self::Ram => "ram",
            Self::Storage => "storage",
        }
    }

    /// Human-facing type label, e.g. `"GPU"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpu => "GPU",
            Self::Cpu => "CPU",
            Self::Motherboard => "Motherboard",
            Self::Ram => "RAM",
            Self::Storage => "Storage",
        }
    }

    #[must_use]
    pub fn is_canonical(self) -> bool {
        !matches!(self, Self::Storage)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts payload keys and labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" | "video card" | "video cards" => Ok(Self::Gpu),
            "cpu" | "processor" => Ok(Self::Cpu),
            "motherboard" | "mobo" => Ok(Self::Motherboard),
            "ram" | "memory" => Ok(Self::Ram),
            "storage" => Ok(Self::Storage),
            other => Err(format!("unknown hardware category: {other}")),
        }
    }
}

// =============================================================================
// OFFERS
// =============================================================================

/// One retailer offer as produced by the pricing webhooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareOffer {
    pub title: String,
    pub source: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_score: Option<f64>,
}

impl HardwareOffer {
    /// Lenient conversion from a raw offer. Non-objects yield `None`;
    /// missing text fields become empty and a missing price stays absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            title: str_field(obj, "title"),
            source: str_field(obj, "source"),
            link: str_field(obj, "link"),
            price: num_field(obj, "price"),
            image_url: str_field(obj, "imageUrl"),
            rating: num_field(obj, "rating"),
            rating_count: num_field(obj, "ratingCount").and_then(count_from_f64),
            value_score: num_field(obj, "valueScore"),
        })
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Numbers, or numeric strings as some automations emit them.
fn num_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from_f64(n: f64) -> Option<u64> {
    (n >= 0.0).then(|| n.round() as u64)
}

// =============================================================================
// CANONICAL RESULT SET
// =============================================================================

/// Specification key holding the offer's retailer.
pub const SPEC_SOURCE: &str = "Source";
/// Specification key holding the formatted value score.
pub const SPEC_VALUE_SCORE: &str = "Value Score";

/// Presentation-ready item derived from one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareItem {
    pub id: String,
    pub name: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
    pub specifications: BTreeMap<String, String>,
    pub link: String,
}

/// All items selected for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub hardware_type: Category,
    pub items: Vec<HardwareItem>,
    pub consider_reviews: bool,
    pub total_items: usize,
}

/// Canonical `{category: {items, considerReviews, totalItems}}` shape.
pub type HardwareResultSet = BTreeMap<Category, CategoryResult>;

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// A part proposed by one of the suggestion webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedComponent {
    pub component: String,
    pub name: String,
}

impl SuggestedComponent {
    /// The category named by `component`, if it is one we know.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.component.parse().ok()
    }
}

/// Suggested parts plus the free-text rationale, when the webhook sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub components: Vec<SuggestedComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
