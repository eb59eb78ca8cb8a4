use super::*;
use serde_json::json;

// =============================================================================
// Category
// =============================================================================

#[test]
fn category_parses_keys_and_labels() {
    assert_eq!("gpu".parse::<Category>().unwrap(), Category::Gpu);
    assert_eq!("GPU".parse::<Category>().unwrap(), Category::Gpu);
    assert_eq!("Video Cards".parse::<Category>().unwrap(), Category::Gpu);
    assert_eq!(" Motherboard ".parse::<Category>().unwrap(), Category::Motherboard);
    assert_eq!("RAM".parse::<Category>().unwrap(), Category::Ram);
    assert!("psu".parse::<Category>().is_err());
}

#[test]
fn category_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Category::Motherboard).unwrap(), json!("motherboard"));
    let parsed: Category = serde_json::from_value(json!("ram")).unwrap();
    assert_eq!(parsed, Category::Ram);
}

#[test]
fn storage_is_not_canonical() {
    assert!(!Category::Storage.is_canonical());
    assert!(Category::CANONICAL.iter().all(|c| c.is_canonical()));
    assert_eq!(Category::QUICK_SEARCH_ORDER[0], Category::Cpu);
}

// =============================================================================
// HardwareOffer::from_value
// =============================================================================

#[test]
fn offer_from_full_object() {
    let offer = HardwareOffer::from_value(&json!({
        "title": "RTX 4070",
        "source": "ShopA",
        "link": "https://shop.example/4070",
        "price": 3999.9,
        "imageUrl": "https://img.example/4070.png",
        "rating": 4.7,
        "ratingCount": 120,
        "valueScore": 8.456
    }))
    .unwrap();
    assert_eq!(offer.title, "RTX 4070");
    assert_eq!(offer.image_url, "https://img.example/4070.png");
    assert_eq!(offer.rating_count, Some(120));
    assert_eq!(offer.value_score, Some(8.456));
}

#[test]
fn offer_from_sparse_object_uses_defaults() {
    let offer = HardwareOffer::from_value(&json!({ "title": "Ryzen 5" })).unwrap();
    assert_eq!(offer.source, "");
    assert_eq!(offer.price, None);
    assert!(offer.rating.is_none());
    assert!(offer.value_score.is_none());
}

#[test]
fn offer_accepts_numeric_strings() {
    let offer = HardwareOffer::from_value(&json!({ "title": "X", "price": "199.90", "ratingCount": "12" })).unwrap();
    assert!((offer.price.unwrap() - 199.9).abs() < 1e-9);
    assert_eq!(offer.rating_count, Some(12));
}

#[test]
fn offer_from_non_object_is_none() {
    assert!(HardwareOffer::from_value(&json!("RTX 4070")).is_none());
    assert!(HardwareOffer::from_value(&json!(null)).is_none());
}

// =============================================================================
// SuggestedComponent
// =============================================================================

#[test]
fn suggested_component_category() {
    let known = SuggestedComponent { component: "cpu".into(), name: "Ryzen 7".into() };
    let unknown = SuggestedComponent { component: "cooler".into(), name: "Tower".into() };
    assert_eq!(known.category(), Some(Category::Cpu));
    assert_eq!(unknown.category(), None);
}

#[test]
fn suggestion_omits_missing_explanation() {
    let s = Suggestion { components: vec![], explanation: None };
    assert_eq!(serde_json::to_value(&s).unwrap(), json!({ "components": [] }));
}
