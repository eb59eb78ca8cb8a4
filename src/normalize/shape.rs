//! Shape detection for webhook payloads.
//!
//! DESIGN
//! ======
//! The automations answer in several shapes. Detection runs once and
//! returns a [`ResponseShape`]; everything downstream matches on the
//! variant instead of probing fields again.
//!
//! - `[{gpu: {...}}, ...]` or `{gpu: {...}}` → `CategoryArray`
//! - `[{output: "...```json ...```..."}]` → `LegacyOutput`
//! - `{data: [...]}` or `[{data: [...]}]` → `DataArray`
//! - anything else → `Unknown`

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::NormalizeError;
use super::types::{Category, SuggestedComponent};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").unwrap_or_else(|e| unreachable!("fence regex: {e}"))
});

const EXPLANATION_KEYS: [&str; 2] = ["Explicacao", "explanation"];

// =============================================================================
// SHAPE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Category objects keyed by `gpu`/`cpu`/... with offer arrays inside.
    CategoryArray(Vec<Map<String, Value>>),
    /// The `output` string of a legacy suggestion response.
    LegacyOutput(String),
    /// The `data` array of a current-style response.
    DataArray(Vec<Value>),
    Unknown,
}

impl ResponseShape {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CategoryArray(_) => "category array",
            Self::LegacyOutput(_) => "legacy output",
            Self::DataArray(_) => "data array",
            Self::Unknown => "unknown",
        }
    }
}

/// Classify a raw payload.
#[must_use]
pub fn detect_shape(value: &Value) -> ResponseShape {
    let elements: Vec<&Map<String, Value>> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(obj) => vec![obj],
        _ => return ResponseShape::Unknown,
    };

    let Some(head) = elements.first() else {
        return ResponseShape::Unknown;
    };

    if let Some(output) = head.get("output").and_then(Value::as_str) {
        return ResponseShape::LegacyOutput(output.to_string());
    }

    if let Some(data) = head.get("data").and_then(Value::as_array) {
        return ResponseShape::DataArray(data.clone());
    }

    if elements.iter().any(|obj| has_category_key(obj)) {
        return ResponseShape::CategoryArray(elements.into_iter().cloned().collect());
    }

    ResponseShape::Unknown
}

pub(crate) fn has_category_key(obj: &Map<String, Value>) -> bool {
    Category::CANONICAL
        .iter()
        .chain(std::iter::once(&Category::Storage))
        .any(|c| obj.get(c.as_str()).is_some_and(Value::is_object))
}

// =============================================================================
// DATA ARRAY PARTITION
// =============================================================================

/// Elements of a `data` array, grouped by the fields they carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataItems {
    pub components: Vec<SuggestedComponent>,
    pub explanation: Option<String>,
    pub categories: Vec<Map<String, Value>>,
}

/// Partition `data` elements by field presence, never by position.
#[must_use]
pub fn partition_data(items: &[Value]) -> DataItems {
    let mut out = DataItems::default();
    for obj in items.iter().filter_map(Value::as_object) {
        if let Some(component) = component_from(obj) {
            out.components.push(component);
        }
        if out.explanation.is_none() {
            out.explanation = EXPLANATION_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map(str::to_string);
        }
        if has_category_key(obj) {
            out.categories.push(obj.clone());
        }
    }
    out
}

fn component_from(obj: &Map<String, Value>) -> Option<SuggestedComponent> {
    let component = obj.get("component")?.as_str()?;
    let name = obj.get("name")?.as_str()?;
    Some(SuggestedComponent { component: component.to_string(), name: name.to_string() })
}

// =============================================================================
// LEGACY OUTPUT
// =============================================================================

/// Locate the fenced JSON block inside a legacy `output` string and parse
/// the suggested components from it.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingFence`] when no ```` ```json ```` block is
/// present and [`NormalizeError::EmbeddedJson`] when its body is not a JSON
/// array.
pub fn parse_legacy_output(output: &str) -> Result<Vec<SuggestedComponent>, NormalizeError> {
    let body = JSON_FENCE
        .captures(output)
        .and_then(|c| c.get(1))
        .ok_or(NormalizeError::MissingFence)?
        .as_str();

    let parsed: Value = serde_json::from_str(body).map_err(|e| NormalizeError::EmbeddedJson(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(NormalizeError::EmbeddedJson("fenced block is not an array".into()));
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(component_from)
        .collect())
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;
