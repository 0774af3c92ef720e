//! Ambient argument resolution.
//!
//! Plans produced by the model routinely omit arguments. Each tool has a
//! fixed fallback chain from the normalized step input to the session
//! state. One rule is absolute: review texts always come from the session,
//! never from the plan. The model may request a summary but must not be
//! able to fabricate review content.

use serde_json::{json, Map, Value};

use crate::session::SessionState;

pub const DEFAULT_NUM_REVIEWS: u64 = 1000;

/// `classify_product` arguments: `title` falls back to the session product.
pub fn classify_args(input: &Map<String, Value>, session: &SessionState) -> Value {
    let title = input
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&session.product.title);
    json!({ "title": title })
}

/// `review_summary_tool` arguments.
pub fn review_summary_args(input: &Map<String, Value>, session: &SessionState) -> Value {
    let product = input
        .get("product")
        .or_else(|| input.get("product_title"))
        .and_then(Value::as_str)
        .unwrap_or(&session.product.title);
    let site = input
        .get("site")
        .and_then(Value::as_str)
        .unwrap_or(session.product.site_or_unknown());
    let num_reviews = input
        .get("num_reviews")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_NUM_REVIEWS);

    json!({
        "product": product,
        "site": site,
        "reviews": session.reviews_value(),
        "num_reviews": num_reviews,
    })
}

/// `calculate` / `verify` expression, defaulting to the empty string.
pub fn expression(input: &Map<String, Value>) -> Value {
    input
        .get("expression")
        .and_then(Value::as_str)
        .unwrap_or("")
        .into()
}

/// `verify` expected value, coerced to floating point; anything
/// uncoercible defaults to 0.
pub fn expected(input: &Map<String, Value>) -> Value {
    let expected = match input.get("expected") {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    json!(expected)
}

/// Legacy `check_consistency` steps, defaulting to an empty list.
pub fn consistency_steps(input: &Map<String, Value>) -> Value {
    input
        .get("steps")
        .filter(|value| value.is_array())
        .cloned()
        .unwrap_or_else(|| json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductData;

    fn session() -> SessionState {
        SessionState::new(ProductData {
            title: "Widget Pro".to_string(),
            site: Some("amazon.com".to_string()),
            price: None,
            url: None,
            reviews: vec!["good".to_string(), "bad".to_string()],
        })
    }

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn classify_title_falls_back_to_session() {
        let args = classify_args(&Map::new(), &session());
        assert_eq!(args, json!({ "title": "Widget Pro" }));
    }

    #[test]
    fn classify_title_from_plan_wins() {
        let args = classify_args(&input(json!({ "title": "Other" })), &session());
        assert_eq!(args["title"], "Other");
    }

    #[test]
    fn review_summary_defaults_fill_missing_params() {
        let args = review_summary_args(&Map::new(), &session());
        assert_eq!(args["product"], "Widget Pro");
        assert_eq!(args["site"], "amazon.com");
        assert_eq!(args["num_reviews"], DEFAULT_NUM_REVIEWS);
        assert_eq!(args["reviews"], json!(["good", "bad"]));
    }

    #[test]
    fn review_summary_reviews_never_come_from_the_plan() {
        let planned = input(json!({
            "product": "X",
            "reviews": ["fabricated five-star praise"]
        }));
        let args = review_summary_args(&planned, &session());
        assert_eq!(args["reviews"], json!(["good", "bad"]));
        assert_eq!(args["product"], "X");
    }

    #[test]
    fn product_title_alias_is_honored() {
        let args = review_summary_args(&input(json!({ "product_title": "Alias" })), &session());
        assert_eq!(args["product"], "Alias");
    }

    #[test]
    fn expression_defaults_to_empty() {
        assert_eq!(expression(&Map::new()), json!(""));
        assert_eq!(expression(&input(json!({ "expression": "1+2" }))), json!("1+2"));
    }

    #[test]
    fn expected_coerces_to_float() {
        assert_eq!(expected(&Map::new()), json!(0.0));
        assert_eq!(expected(&input(json!({ "expected": 3 }))), json!(3.0));
        assert_eq!(expected(&input(json!({ "expected": "2.5" }))), json!(2.5));
        assert_eq!(expected(&input(json!({ "expected": "junk" }))), json!(0.0));
    }
}
