//! Final synthesis.
//!
//! The accumulated tool results, the self-check report, and the shopper's
//! preferences go back to the language model for a structured
//! recommendation. If the model's output cannot be decoded, a
//! deterministic fallback report is assembled from the raw tool results,
//! so the request still returns structurally valid JSON.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::llm::{extract_json_block, TextGenerator};
use crate::preferences::Preferences;
use crate::session::{SessionState, ToolResults};
use crate::tools::chain::object_entry;
use crate::tools::selfcheck::SelfCheckReport;

const SYNTHESIS_INSTRUCTIONS: &str = "\
You are a product review analyzer. You have analyzed the reviews for a \
product and now need to provide a structured summary with sentiment \
analysis and confidence score.

Create a concise response including:
1. Review sentiment summary with pros and cons
2. Confidence score (0-100) with explanation
3. Key factors that influenced the confidence score
4. Confidence level interpretation

Weight the recommendation against the shopper's preferences where they are
provided (price range, preferred brands, features to prioritize or avoid,
minimum thresholds).

Output must be JSON with these fields:
- title: product title
- overall_sentiment: positive, negative, or neutral
- sentiment_score: numerical sentiment score
- confidence_score: numerical confidence score (0-100)
- confidence_level: text interpretation of the confidence score
- pros: array of key pros from reviews
- cons: array of key cons from reviews
- confidence_explanation: how the confidence score was calculated
- confidence_components: score component breakdown when available
- review_count: number of reviews analyzed
- reliability_score: score from the self-check (0-100)
- reliability_level: level from the self-check (Low, Medium, High)
- issues: critical issues found during the self-check
- warnings: warnings found during the self-check
- insights: insights found during the self-check

TASK: Generate the final sentiment analysis and confidence assessment.";

pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produce the final report. Degrades instead of failing: a silent or
    /// unreachable model yields an `error` object, an undecodable reply
    /// yields the fallback report.
    pub async fn finalize(
        &self,
        session: &SessionState,
        results: &ToolResults,
        self_check: &SelfCheckReport,
        preferences: &Preferences,
    ) -> Value {
        let prompt = synthesis_prompt(session, results, self_check, preferences);

        let text = match self.generator.generate(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::error!("no final response from language model");
                return json!({ "error": "failed to get final response from language model" });
            }
            Err(error) => {
                tracing::error!(%error, "final reasoning failed");
                return json!({ "error": "failed to get final response from language model" });
            }
        };

        match serde_json::from_str::<Value>(extract_json_block(&text)) {
            Ok(report) if report.is_object() => report,
            _ => {
                tracing::warn!("final response was not valid JSON, using fallback report");
                fallback_report(session, results)
            }
        }
    }
}

fn synthesis_prompt(
    session: &SessionState,
    results: &ToolResults,
    self_check: &SelfCheckReport,
    preferences: &Preferences,
) -> String {
    // Review texts are embedded as a count, not content.
    let product_info = json!({
        "title": session.product.title,
        "site": session.product.site_or_unknown(),
        "price": session.product.price.as_deref().unwrap_or("Unknown"),
        "url": session.product.url.as_deref().unwrap_or("Unknown"),
        "reviews": format!("[{} reviews]", session.product.reviews.len()),
    });
    let category = session.category.as_deref().unwrap_or("Unknown");
    let (issues, warnings, insights) = self_check.counts();
    let check_summary = json!({
        "reliability_score": self_check.reliability_score,
        "reliability_level": self_check.reliability_level,
        "issues_count": issues,
        "warnings_count": warnings,
        "insights_count": insights,
    });
    let preferences_json =
        serde_json::to_string(preferences).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{SYNTHESIS_INSTRUCTIONS}\n\nPRODUCT INFO: {product_info}\nCATEGORY: {category}\nTOOL RESULTS: {}\nSELF CHECK: {check_summary}\nUSER PREFERENCES: {preferences_json}",
        Value::Object(results.clone())
    )
}

/// Deterministic report assembled from raw tool results when the model's
/// final answer cannot be decoded.
pub fn fallback_report(session: &SessionState, results: &ToolResults) -> Value {
    let summary = object_entry(results, "review_summary_tool").unwrap_or_default();
    let confidence = object_entry(results, "calculate_confidence_score").unwrap_or_default();
    let self_check = object_entry(results, "self_check_tool_results").unwrap_or_default();

    json!({
        "title": session.product.title,
        "overall_sentiment": field(&summary, "overall_sentiment", json!("Unknown")),
        "sentiment_score": field(&summary, "sentiment_score", json!(0)),
        "confidence_score": field(&confidence, "confidence_score", json!(0)),
        "confidence_level": field(&confidence, "confidence_level", json!("Unknown confidence")),
        "pros": field(&summary, "pros", json!(["No pros found"])),
        "cons": field(&summary, "cons", json!(["No cons found"])),
        "confidence_explanation": field(
            &confidence,
            "explanation",
            json!("Could not calculate confidence score")
        ),
        "confidence_components": field(&confidence, "components", json!({})),
        "review_count": field(&summary, "review_count", json!(0)),
        "reliability_score": field(&self_check, "reliability_score", json!(0)),
        "reliability_level": field(&self_check, "reliability_level", json!("Unknown")),
        "issues": field(&self_check, "issues", json!([])),
        "warnings": field(&self_check, "warnings", json!([])),
        "insights": field(&self_check, "insights", json!([])),
        "error": "Failed to generate structured analysis",
    })
}

fn field(entry: &Map<String, Value>, key: &str, default: Value) -> Value {
    entry.get(key).cloned().unwrap_or(default)
}

/// Deterministic comparison of the final report against the shopper's
/// processed preferences. Criteria that cannot be evaluated (no price on
/// the product, no brand or avoid lists) are reported as `null` and left
/// out of the score.
pub fn preference_match(report: &Value, session: &SessionState, preferences: &Preferences) -> Value {
    let mut considered = 0usize;
    let mut matched = 0usize;
    let mut criteria = Map::new();

    let mut record = |key: &str, verdict: Option<bool>| {
        match verdict {
            Some(ok) => {
                considered += 1;
                if ok {
                    matched += 1;
                }
                criteria.insert(key.to_string(), Value::Bool(ok));
            }
            None => {
                criteria.insert(key.to_string(), Value::Null);
            }
        }
    };

    let confidence = report.get("confidence_score").and_then(Value::as_f64);
    record(
        "confidence_threshold_met",
        Some(confidence.unwrap_or(0.0) >= preferences.confidence_threshold),
    );
    let sentiment = report.get("sentiment_score").and_then(Value::as_f64);
    record(
        "sentiment_threshold_met",
        Some(sentiment.unwrap_or(0.0) >= preferences.sentiment_threshold),
    );
    let review_count = report.get("review_count").and_then(Value::as_u64);
    record(
        "review_threshold_met",
        Some(review_count.unwrap_or(0) >= u64::from(preferences.review_threshold)),
    );

    let price = session.product.price.as_deref().and_then(parse_price);
    record(
        "price_in_range",
        price.map(|price| preferences.price_range.contains(price)),
    );

    let avoid_verdict = if preferences.avoid_features.is_empty() {
        None
    } else {
        let cons: Vec<String> = report
            .get("cons")
            .and_then(Value::as_array)
            .map(|cons| {
                cons.iter()
                    .filter_map(|con| con.as_str())
                    .map(str::to_ascii_lowercase)
                    .collect()
            })
            .unwrap_or_default();
        let clear = !preferences.avoid_features.iter().any(|feature| {
            let feature = feature.to_ascii_lowercase();
            cons.iter().any(|con| con.contains(&feature))
        });
        Some(clear)
    };
    record("avoided_features_clear", avoid_verdict);

    let brand_verdict = if preferences.brand_preferences.is_empty() {
        None
    } else {
        let title = session.product.title.to_ascii_lowercase();
        Some(
            preferences
                .brand_preferences
                .iter()
                .any(|brand| title.contains(&brand.to_ascii_lowercase())),
        )
    };
    record("preferred_brand_matched", brand_verdict);

    let score = if considered == 0 {
        0.0
    } else {
        (matched as f64 / considered as f64 * 100.0).round()
    };

    json!({ "preference_match": { "score": score, "criteria": criteria } })
}

/// Pull the leading numeric value out of a price string like "$1,199.99".
fn parse_price(price: &str) -> Option<f64> {
    let cleaned: String = price
        .chars()
        .filter(|character| character.is_ascii_digit() || *character == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
