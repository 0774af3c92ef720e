//! Planning-phase prompt construction.

use serde_json::json;

use crate::preferences::Preferences;
use crate::types::ProductData;

const PLANNING_INSTRUCTIONS: &str = "\
You are a product review analyzer. Your task is to analyze product reviews \
and provide a sentiment analysis with a confidence score to help shoppers \
make informed decisions.

You will create a tool invocation plan to:
1. Classify the product category
2. Summarize reviews using sentiment analysis
3. Calculate a confidence score based on the review sentiment
4. Provide detailed reasoning and consistency checks

You have access to these tools:
- classify_product(title: str) - Classifies product category based on title
- review_summary_tool(product: str, site: str, num_reviews: int) - Analyzes product reviews and returns sentiment analysis
- calculate_confidence_score(sentiment_data: dict) - Calculates a confidence score based on sentiment data
- self_check_tool_results(tools_results: dict) - Checks reliability of the accumulated results and highlights potential issues
- show_reasoning(product_data: dict) - Shows a detailed explanation of the sentiment and confidence calculation
- calculate(expression: str) - Calculates sentiment metrics or confidence score components
- verify(expression: str, expected: float) - Verifies sentiment or confidence calculations
- review_consistency_check(reviews_data: dict) - Checks consistency of review sentiments and identifies potential biases

Typical workflow:
1. First use review_summary_tool to get sentiment analysis of the reviews
2. Then pass those results to calculate_confidence_score
3. Use self_check_tool_results to validate the reliability of the analysis
4. Use show_reasoning and review_consistency_check for detail

Example tool invocation plan:
```json
{
  \"tool_calls\": [
    { \"tool_name\": \"review_summary_tool\",
      \"parameters\": { \"product\": \"Samsung Galaxy S23 Ultra\", \"site\": \"amazon.com\", \"num_reviews\": 1000 } },
    { \"tool_name\": \"calculate_confidence_score\",
      \"parameters\": { \"sentiment_data\": { \"sentiment_score\": 0.75, \"review_count\": 10, \"pros\": [\"Great camera\"], \"cons\": [\"Price\"] } } },
    { \"tool_name\": \"self_check_tool_results\", \"parameters\": {} },
    { \"tool_name\": \"show_reasoning\", \"parameters\": {} },
    { \"tool_name\": \"review_consistency_check\", \"parameters\": {} }
  ]
}
```

Your response must be JSON with a \"tool_calls\" array using the EXACT \
function names shown above.

TASK: Create a tool invocation plan to analyze reviews and calculate confidence.";

/// Build the full planning prompt: instructions, then the product context
/// and the shopper's processed preferences.
pub fn planning_prompt(
    product: &ProductData,
    category: &str,
    preferences: &Preferences,
) -> String {
    let product_json = json!({
        "title": product.title,
        "site": product.site_or_unknown(),
        "category": category,
        "price": product.price.as_deref().unwrap_or("Unknown"),
        "url": product.url.as_deref().unwrap_or("Unknown"),
    });
    let preferences_json =
        serde_json::to_string(preferences).unwrap_or_else(|_| "{}".to_string());

    format!("{PLANNING_INSTRUCTIONS}\n\nPRODUCT: {product_json}\nUSER PREFERENCES: {preferences_json}")
}
