//! Response normalizer: heterogeneous webhook JSON to canonical shapes.
//!
//! DESIGN
//! ======
//! Parsing is split in two: [`shape::detect_shape`] classifies the payload,
//! then the functions here interpret the variant they expect. Everything is
//! pure so it can be exercised without a network.
//!
//! Offer payloads keep their raw category objects in [`NormalizedOffers`],
//! which lets the caller flip between `best_price` and `best_score` without
//! calling the webhook again.

pub mod shape;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub use shape::{DataItems, ResponseShape, detect_shape, partition_data};
pub use types::{
    Category, CategoryResult, HardwareItem, HardwareOffer, HardwareResultSet, SPEC_SOURCE, SPEC_VALUE_SCORE,
    SuggestedComponent, Suggestion,
};

const BEST_PRICE: &str = "best_price";
const BEST_SCORE: &str = "best_score";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// None of the known payload shapes matched.
    #[error("unrecognized response shape")]
    UnrecognizedShape,

    /// A known shape arrived where a different one was required.
    #[error("expected {expected} payload, got {found}")]
    UnexpectedShape { expected: &'static str, found: &'static str },

    /// A legacy `output` string carried no fenced JSON block.
    #[error("no ```json block found in output")]
    MissingFence,

    /// The fenced JSON block did not parse.
    #[error("embedded JSON is invalid: {0}")]
    EmbeddedJson(String),

    /// A quick-search payload had no category with both offer rankings.
    #[error("no category with both best_price and best_score offers")]
    NoValidCategory,
}

impl crate::error::ErrorCode for NormalizeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnrecognizedShape => "E_UNRECOGNIZED_SHAPE",
            Self::UnexpectedShape { .. } => "E_UNEXPECTED_SHAPE",
            Self::MissingFence => "E_MISSING_FENCE",
            Self::EmbeddedJson(_) => "E_EMBEDDED_JSON",
            Self::NoValidCategory => "E_NO_VALID_CATEGORY",
        }
    }
}

// =============================================================================
// OFFERS
// =============================================================================

/// Canonical result set plus the raw category objects it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOffers {
    pub data: HardwareResultSet,
    pub consider_reviews: bool,
    pub raw: Vec<Map<String, Value>>,
}

impl NormalizedOffers {
    /// Rebuild the result set from the retained raw data.
    pub fn reselect(&mut self, consider_reviews: bool) {
        self.data = build_result_set(&self.raw, consider_reviews);
        self.consider_reviews = consider_reviews;
    }

    /// Items for a single category under the given ranking.
    #[must_use]
    pub fn items_for(&self, category: Category, consider_reviews: bool) -> Vec<HardwareItem> {
        items_for(&self.raw, category, consider_reviews)
    }
}

/// Normalize an offer payload (category array, lone category object, or a
/// `data` array holding category objects).
///
/// # Errors
///
/// Returns [`NormalizeError::UnrecognizedShape`] when the payload matches no
/// known shape, or [`NormalizeError::UnexpectedShape`] for a suggestion-only
/// payload.
pub fn normalize_offers(raw: &Value, consider_reviews: bool) -> Result<NormalizedOffers, NormalizeError> {
    let categories = match detect_shape(raw) {
        ResponseShape::CategoryArray(objs) => objs,
        ResponseShape::DataArray(items) => {
            let parts = partition_data(&items);
            if parts.categories.is_empty() {
                return Err(NormalizeError::UnexpectedShape { expected: "offer", found: "suggestion data array" });
            }
            parts.categories
        }
        ResponseShape::LegacyOutput(_) => {
            return Err(NormalizeError::UnexpectedShape { expected: "offer", found: "legacy output" });
        }
        ResponseShape::Unknown => return Err(NormalizeError::UnrecognizedShape),
    };

    Ok(NormalizedOffers { data: build_result_set(&categories, consider_reviews), consider_reviews, raw: categories })
}

/// Build the canonical result set. A later category object overrides an
/// earlier one for the same category; categories without a usable array are
/// left out.
#[must_use]
pub fn build_result_set(raw: &[Map<String, Value>], consider_reviews: bool) -> HardwareResultSet {
    let mut out = HardwareResultSet::new();
    for obj in raw {
        for category in Category::CANONICAL {
            let Some(offers) = select_offers(obj, category, consider_reviews) else {
                continue;
            };
            let items: Vec<HardwareItem> = offers
                .iter()
                .enumerate()
                .filter_map(|(index, raw)| raw_item(category, index, raw))
                .collect();
            out.insert(
                category,
                CategoryResult { hardware_type: category, total_items: items.len(), items, consider_reviews },
            );
        }
    }
    out
}

/// Items for one category across every raw category object, numbered
/// continuously so ids stay unique.
#[must_use]
pub fn items_for(raw: &[Map<String, Value>], category: Category, consider_reviews: bool) -> Vec<HardwareItem> {
    raw.iter()
        .filter_map(|obj| select_offers(obj, category, consider_reviews))
        .flatten()
        .enumerate()
        .filter_map(|(index, raw)| raw_item(category, index, raw))
        .collect()
}

/// Ids keep the raw array position, so skipped entries leave gaps.
fn raw_item(category: Category, index: usize, raw: &Value) -> Option<HardwareItem> {
    HardwareOffer::from_value(raw).map(|offer| to_item(category, index, &offer))
}

fn select_offers(obj: &Map<String, Value>, category: Category, consider_reviews: bool) -> Option<&Vec<Value>> {
    let group = obj.get(category.as_str())?.as_object()?;
    let key = if consider_reviews { BEST_SCORE } else { BEST_PRICE };
    let offers = group.get(key).and_then(Value::as_array);
    if offers.is_none() {
        debug!(%category, key, "no offer array for category");
    }
    offers
}

/// Map one offer into the canonical item shape.
#[must_use]
pub fn to_item(category: Category, index: usize, offer: &HardwareOffer) -> HardwareItem {
    let mut specifications = std::collections::BTreeMap::new();
    specifications.insert(SPEC_SOURCE.to_string(), offer.source.clone());
    specifications.insert(SPEC_VALUE_SCORE.to_string(), format_value_score(offer.value_score));

    HardwareItem {
        id: format!("{category}-{index}"),
        name: offer.title.clone(),
        model: offer.title.clone(),
        price: offer.price,
        image_url: offer.image_url.clone(),
        rating: offer.rating,
        reviews: offer.rating_count,
        specifications,
        link: offer.link.clone(),
    }
}

/// Two decimals when present, `"N/A"` otherwise. Exact ties round away
/// from zero.
#[must_use]
pub fn format_value_score(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), two_decimals)
}

#[allow(clippy::float_cmp)]
fn two_decimals(score: f64) -> String {
    if score == 0.0 {
        return "0.00".to_string();
    }
    // A value sits exactly between two cents only when it is an odd multiple
    // of 1/8; scaling by 8 is exact.
    let eighths = score.abs() * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        let cents = (score.abs() * 100.0).ceil();
        return format!("{:.2}", score.signum() * cents / 100.0);
    }
    format!("{score:.2}")
}

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// Parse a suggestion payload (legacy `output` or `data` array).
///
/// # Errors
///
/// Returns [`NormalizeError::UnrecognizedShape`] for unknown payloads,
/// [`NormalizeError::UnexpectedShape`] for offer payloads, and the legacy
/// parsing errors from [`shape::parse_legacy_output`].
pub fn parse_suggestion(raw: &Value) -> Result<Suggestion, NormalizeError> {
    match detect_shape(raw) {
        ResponseShape::LegacyOutput(output) => {
            Ok(Suggestion { components: shape::parse_legacy_output(&output)?, explanation: None })
        }
        ResponseShape::DataArray(items) => {
            let parts = partition_data(&items);
            Ok(Suggestion { components: parts.components, explanation: parts.explanation })
        }
        ResponseShape::CategoryArray(_) => {
            Err(NormalizeError::UnexpectedShape { expected: "suggestion", found: "category array" })
        }
        ResponseShape::Unknown => Err(NormalizeError::UnrecognizedShape),
    }
}

// =============================================================================
// QUICK SEARCH
// =============================================================================

/// Offers for the single category a quick search returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickSearchOffers {
    pub category: Category,
    pub best_price: Vec<HardwareOffer>,
    pub best_score: Vec<HardwareOffer>,
}

impl QuickSearchOffers {
    /// Canonical items for the chosen ranking.
    #[must_use]
    pub fn items(&self, consider_reviews: bool) -> Vec<HardwareItem> {
        let offers = if consider_reviews { &self.best_score } else { &self.best_price };
        offers
            .iter()
            .enumerate()
            .map(|(index, offer)| to_item(self.category, index, offer))
            .collect()
    }
}

/// Pick the first category (in [`Category::QUICK_SEARCH_ORDER`]) that carries
/// both ranking arrays. Arrays and lone objects are both accepted; only the
/// first element of an array is inspected.
///
/// # Errors
///
/// Returns [`NormalizeError::UnrecognizedShape`] for non-object payloads and
/// [`NormalizeError::NoValidCategory`] when no category qualifies.
pub fn extract_quick_search_offers(raw: &Value) -> Result<QuickSearchOffers, NormalizeError> {
    let head = match raw {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(obj) => Some(obj),
        _ => None,
    }
    .ok_or(NormalizeError::UnrecognizedShape)?;

    for category in Category::QUICK_SEARCH_ORDER {
        let Some(group) = head.get(category.as_str()).and_then(Value::as_object) else {
            continue;
        };
        let (Some(price), Some(score)) =
            (group.get(BEST_PRICE).and_then(Value::as_array), group.get(BEST_SCORE).and_then(Value::as_array))
        else {
            continue;
        };
        return Ok(QuickSearchOffers {
            category,
            best_price: price.iter().filter_map(HardwareOffer::from_value).collect(),
            best_score: score.iter().filter_map(HardwareOffer::from_value).collect(),
        });
    }

    Err(NormalizeError::NoValidCategory)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
