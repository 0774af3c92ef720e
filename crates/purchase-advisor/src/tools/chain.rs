//! Result chaining.
//!
//! Later plan steps consume earlier steps' outputs. Every extraction here
//! is independently guarded: an upstream entry that is absent, failed to
//! decode (stored as a raw string), or has the wrong shape yields the
//! documented default instead of aborting the chain.

use serde_json::{json, Map, Value};

use crate::session::{SessionState, ToolResults};
use crate::tools::catalog::ToolKind;

/// `calculate_confidence_score` input: the review summary verbatim when
/// present and object-shaped, else a zero-valued sentiment object.
pub fn confidence_input(results: &ToolResults) -> Value {
    match object_entry(results, ToolKind::ReviewSummary.result_key()) {
        Some(summary) => Value::Object(summary),
        None => json!({
            "overall_sentiment": "Unknown",
            "sentiment_score": 0,
            "review_count": 0,
            "pros": [],
            "cons": [],
        }),
    }
}

/// `self_check_tool_results` input: everything accumulated so far.
pub fn self_check_input(results: &ToolResults) -> Value {
    Value::Object(results.clone())
}

/// `show_reasoning` input: a `product_data` object assembled from three
/// upstream tools, each field defaulting when its source is missing.
pub fn reasoning_input(session: &SessionState, results: &ToolResults) -> Value {
    let summary = object_entry(results, ToolKind::ReviewSummary.result_key());
    let confidence = object_entry(results, ToolKind::ConfidenceScore.result_key());
    let self_check = object_entry(results, ToolKind::SelfCheck.result_key());

    json!({
        "product_name": session.product.title,
        "sentiment_score": number_field(summary.as_ref(), "sentiment_score"),
        "review_count": number_field(summary.as_ref(), "review_count"),
        "pros": list_field(summary.as_ref(), "pros"),
        "cons": list_field(summary.as_ref(), "cons"),
        "confidence_score": number_field(confidence.as_ref(), "confidence_score"),
        "reliability_score": number_field(self_check.as_ref(), "reliability_score"),
        "reliability_level": self_check
            .as_ref()
            .and_then(|check| check.get("reliability_level"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown"),
    })
}

/// `review_consistency_check` input: the summary's reviews and per-review
/// sentiments, both defaulting to empty lists.
pub fn consistency_input(results: &ToolResults) -> Value {
    let summary = object_entry(results, ToolKind::ReviewSummary.result_key());
    json!({
        "reviews": list_field(summary.as_ref(), "reviews"),
        "sentiments": list_field(summary.as_ref(), "sentiments"),
    })
}

/// Fetch a result entry as an object. A string entry (a structured tool
/// whose payload failed to decode) gets one more decode attempt here.
pub(crate) fn object_entry(results: &ToolResults, key: &str) -> Option<Map<String, Value>> {
    match results.get(key)? {
        Value::Object(object) => Some(object.clone()),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| value.as_object().cloned()),
        _ => None,
    }
}

fn number_field(entry: Option<&Map<String, Value>>, key: &str) -> Value {
    entry
        .and_then(|entry| entry.get(key))
        .filter(|value| value.is_number())
        .cloned()
        .unwrap_or(json!(0))
}

fn list_field(entry: Option<&Map<String, Value>>, key: &str) -> Value {
    entry
        .and_then(|entry| entry.get(key))
        .filter(|value| value.is_array())
        .cloned()
        .unwrap_or(json!([]))
}
