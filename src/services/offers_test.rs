use super::*;
use crate::normalize::SPEC_VALUE_SCORE;
use crate::services::test_helpers::mock_assistant;
use crate::webhook::test_helpers::{MOCK_BASE, MockTransport};
use std::sync::Arc;

fn quick_url() -> String {
    format!("{MOCK_BASE}/quick-search")
}

#[tokio::test]
async fn quick_search_picks_category_and_records_request() {
    let transport = Arc::new(MockTransport::default());
    let assistant = mock_assistant(transport.clone());
    transport.respond(
        &quick_url(),
        Ok(json!([{ "gpu": {
            "best_price": [{ "title": "RTX 4060 Ventus", "price": 1899.9, "source": "ShopA" }],
            "best_score": [{ "title": "RTX 4060 Eagle", "price": 2099.0, "valueScore": 8.5 }]
        } }])),
    );

    let offers = assistant
        .quick_search_offers(Category::Gpu, " RTX 4060 ")
        .await
        .unwrap();
    assert_eq!(offers.category, Category::Gpu);
    assert_eq!(offers.best_price[0].title, "RTX 4060 Ventus");
    assert_eq!(offers.items(true)[0].specifications[SPEC_VALUE_SCORE], "8.50");

    let calls = transport.calls();
    let body = &calls[0].1;
    assert_eq!(body["source"], "quick-search");
    assert_eq!(body["data"], json!({ "gpu": "RTX 4060" }));

    let entries = assistant.history().list();
    let entry = &entries[0];
    assert_eq!(entry.source, HistorySource::QuickSearch);
    assert_eq!(entry.title, "RTX 4060");
    assert_eq!(entry.request, json!({ "hardwareType": "GPU", "hardwareName": "RTX 4060" }));
    assert!(!entry.is_failure());
}

#[tokio::test]
async fn quick_search_without_rankings_is_recorded_as_failure() {
    let transport = Arc::new(MockTransport::default());
    let assistant = mock_assistant(transport.clone());
    transport.respond(&quick_url(), Ok(json!([{ "cpu": { "best_price": [] } }])));

    let err = assistant
        .quick_search_offers(Category::Cpu, "Ryzen 5 7600")
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::Normalize(normalize::NormalizeError::NoValidCategory)));

    let entries = assistant.history().list();
    let entry = &entries[0];
    assert!(entry.is_failure());
    assert_eq!(entry.response.as_ref().unwrap()["code"], "E_NO_VALID_CATEGORY");
}

#[tokio::test]
async fn quick_search_rejects_blank_name() {
    let transport = Arc::new(MockTransport::default());
    let assistant = mock_assistant(transport.clone());

    let err = assistant
        .quick_search_offers(Category::Ram, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::EmptyInput(_)));
    assert!(transport.calls().is_empty());
    assert!(assistant.history().is_empty());
}

#[test]
fn descriptor_uses_category_label() {
    let d = quick_search_descriptor(Category::Motherboard, "B650");
    assert_eq!(d.kind, TaskKind::QuickSearch);
    assert_eq!(d.subtitle.as_deref(), Some("Motherboard"));
}
