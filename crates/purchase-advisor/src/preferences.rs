//! User preference processing.
//!
//! Raw preferences arrive as free-form JSON from the extension. They are
//! merged field by field over defaults; a missing or wrongly-typed field
//! keeps its default rather than failing the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_REVIEW_THRESHOLD: u32 = 10;
pub const DEFAULT_SENTIMENT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 70.0;

/// Acceptable price window. `max: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && self.max.map_or(true, |max| price <= max)
    }
}

/// Processed user preferences, used to weight the final recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub price_range: PriceRange,
    pub brand_preferences: Vec<String>,
    pub feature_priorities: Vec<String>,
    pub avoid_features: Vec<String>,
    pub review_threshold: u32,
    pub sentiment_threshold: f64,
    pub confidence_threshold: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            price_range: PriceRange { min: 0.0, max: None },
            brand_preferences: Vec::new(),
            feature_priorities: Vec::new(),
            avoid_features: Vec::new(),
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            sentiment_threshold: DEFAULT_SENTIMENT_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Merge raw user preferences over the defaults.
pub fn process_preferences(raw: Option<&Value>) -> Preferences {
    let mut preferences = Preferences::default();
    let Some(Value::Object(raw)) = raw else {
        return preferences;
    };

    if let Some(Value::Object(range)) = raw.get("price_range") {
        if let Some(min) = range.get("min").and_then(as_f64) {
            preferences.price_range.min = min;
        }
        if let Some(max) = range.get("max").and_then(as_f64) {
            preferences.price_range.max = Some(max);
        }
    }

    if let Some(brands) = string_list(raw.get("brand_preferences")) {
        preferences.brand_preferences = brands;
    }
    if let Some(features) = string_list(raw.get("feature_priorities")) {
        preferences.feature_priorities = features;
    }
    if let Some(avoid) = string_list(raw.get("avoid_features")) {
        preferences.avoid_features = avoid;
    }

    if let Some(threshold) = raw.get("review_threshold").and_then(as_f64) {
        preferences.review_threshold = threshold.max(0.0) as u32;
    }
    if let Some(threshold) = raw.get("sentiment_threshold").and_then(as_f64) {
        preferences.sentiment_threshold = threshold;
    }
    if let Some(threshold) = raw.get("confidence_threshold").and_then(as_f64) {
        preferences.confidence_threshold = threshold;
    }

    preferences
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let Some(Value::Array(items)) = value else {
        return None;
    };
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_preferences_yield_defaults() {
        let preferences = process_preferences(None);
        assert_eq!(preferences, Preferences::default());
        assert_eq!(preferences.review_threshold, DEFAULT_REVIEW_THRESHOLD);
    }

    #[test]
    fn provided_fields_override_defaults() {
        let raw = json!({
            "price_range": { "min": 100, "max": 500 },
            "brand_preferences": ["Samsung", "Sony"],
            "avoid_features": ["bloatware"],
            "review_threshold": 25,
            "confidence_threshold": 80
        });
        let preferences = process_preferences(Some(&raw));
        assert_eq!(preferences.price_range.min, 100.0);
        assert_eq!(preferences.price_range.max, Some(500.0));
        assert_eq!(preferences.brand_preferences, ["Samsung", "Sony"]);
        assert_eq!(preferences.review_threshold, 25);
        assert_eq!(preferences.confidence_threshold, 80.0);
        // Untouched fields keep defaults.
        assert_eq!(preferences.sentiment_threshold, DEFAULT_SENTIMENT_THRESHOLD);
    }

    #[test]
    fn wrongly_typed_fields_keep_defaults() {
        let raw = json!({
            "price_range": "cheap",
            "brand_preferences": "Samsung",
            "review_threshold": { "value": 5 }
        });
        let preferences = process_preferences(Some(&raw));
        assert_eq!(preferences, Preferences::default());
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let raw = json!({ "sentiment_threshold": "0.8" });
        let preferences = process_preferences(Some(&raw));
        assert_eq!(preferences.sentiment_threshold, 0.8);
    }

    #[test]
    fn price_range_containment() {
        let bounded = PriceRange { min: 10.0, max: Some(20.0) };
        assert!(bounded.contains(15.0));
        assert!(!bounded.contains(25.0));
        let unbounded = PriceRange { min: 0.0, max: None };
        assert!(unbounded.contains(1_000_000.0));
    }
}
