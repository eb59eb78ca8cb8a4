use super::*;
use serde_json::json;

// =============================================================================
// detect_shape
// =============================================================================

#[test]
fn detects_category_array() {
    let raw = json!([{ "gpu": { "best_price": [], "best_score": [] } }]);
    assert!(matches!(detect_shape(&raw), ResponseShape::CategoryArray(objs) if objs.len() == 1));
}

#[test]
fn lone_category_object_is_one_element_array() {
    let raw = json!({ "cpu": { "best_price": [] } });
    let ResponseShape::CategoryArray(objs) = detect_shape(&raw) else {
        panic!("expected category array");
    };
    assert_eq!(objs.len(), 1);
    assert!(objs[0].contains_key("cpu"));
}

#[test]
fn detects_legacy_output() {
    let raw = json!([{ "output": "here:\n```json\n[]\n```" }]);
    assert!(matches!(detect_shape(&raw), ResponseShape::LegacyOutput(s) if s.starts_with("here")));
}

#[test]
fn detects_data_array_in_object_and_array() {
    let obj = json!({ "data": [{ "component": "cpu", "name": "X" }] });
    let arr = json!([{ "data": [{ "Explicacao": "because" }] }]);
    assert!(matches!(detect_shape(&obj), ResponseShape::DataArray(items) if items.len() == 1));
    assert!(matches!(detect_shape(&arr), ResponseShape::DataArray(items) if items.len() == 1));
}

#[test]
fn empty_and_scalar_payloads_are_unknown() {
    assert_eq!(detect_shape(&json!({})), ResponseShape::Unknown);
    assert_eq!(detect_shape(&json!([])), ResponseShape::Unknown);
    assert_eq!(detect_shape(&json!("text")), ResponseShape::Unknown);
    assert_eq!(detect_shape(&json!([1, 2])), ResponseShape::Unknown);
}

#[test]
fn category_key_with_scalar_value_is_unknown() {
    assert_eq!(detect_shape(&json!({ "gpu": "RTX 4070" })), ResponseShape::Unknown);
}

#[test]
fn output_that_is_not_a_string_is_not_legacy() {
    let raw = json!([{ "output": 42 }]);
    assert_eq!(detect_shape(&raw), ResponseShape::Unknown);
}

// =============================================================================
// partition_data
// =============================================================================

#[test]
fn partition_ignores_position() {
    let items = vec![
        json!({ "Explicacao": "Balanced build for 1440p" }),
        json!({ "component": "gpu", "name": "RTX 4070" }),
        json!({ "component": "cpu", "name": "Ryzen 7 7700" }),
        json!({ "gpu": { "best_price": [] } }),
        json!("noise"),
    ];
    let parts = partition_data(&items);
    assert_eq!(parts.components.len(), 2);
    assert_eq!(parts.components[0].name, "RTX 4070");
    assert_eq!(parts.explanation.as_deref(), Some("Balanced build for 1440p"));
    assert_eq!(parts.categories.len(), 1);
}

#[test]
fn partition_accepts_english_explanation_key() {
    let parts = partition_data(&[json!({ "explanation": "why" })]);
    assert_eq!(parts.explanation.as_deref(), Some("why"));
    assert!(parts.components.is_empty());
}

#[test]
fn partition_skips_component_without_name() {
    let parts = partition_data(&[json!({ "component": "ram" })]);
    assert!(parts.components.is_empty());
}

// =============================================================================
// parse_legacy_output
// =============================================================================

#[test]
fn legacy_output_extracts_fenced_components() {
    let output = "Sugestão:\n```json\n[{\"component\":\"cpu\",\"name\":\"X\"}]\n```\nfim";
    let components = parse_legacy_output(output).unwrap();
    assert_eq!(components, vec![SuggestedComponent { component: "cpu".into(), name: "X".into() }]);
}

#[test]
fn legacy_output_tolerates_crlf() {
    let output = "```json\r\n[{\"component\":\"ram\",\"name\":\"32GB\"}]\r\n```";
    let components = parse_legacy_output(output).unwrap();
    assert_eq!(components.len(), 1);
}

#[test]
fn legacy_output_without_fence_errors() {
    let err = parse_legacy_output("[{\"component\":\"cpu\",\"name\":\"X\"}]").unwrap_err();
    assert!(matches!(err, NormalizeError::MissingFence));
}

#[test]
fn legacy_output_with_invalid_json_errors() {
    let err = parse_legacy_output("```json\n[{oops}]\n```").unwrap_err();
    assert!(matches!(err, NormalizeError::EmbeddedJson(_)));
}

#[test]
fn legacy_output_with_object_body_errors() {
    let err = parse_legacy_output("```json\n{\"component\":\"cpu\"}\n```").unwrap_err();
    assert!(matches!(err, NormalizeError::EmbeddedJson(_)));
}
