//! Per-request session state threaded through plan execution.

use serde_json::Value;

use crate::types::ProductData;

/// Accumulated tool outputs, keyed by canonical tool name.
///
/// `serde_json::Map` preserves insertion order (the `preserve_order`
/// feature), so the mapping reflects execution order.
pub type ToolResults = serde_json::Map<String, Value>;

/// Ambient context for one analysis request.
///
/// Owned by the plan executor for the lifetime of a single request;
/// never shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub product: ProductData,
    pub category: Option<String>,
    pub results: ToolResults,
}

impl SessionState {
    pub fn new(product: ProductData) -> Self {
        Self {
            product,
            category: None,
            results: ToolResults::new(),
        }
    }

    /// The session's review texts as a JSON array. Always sourced from the
    /// request payload, never from an LLM-authored plan.
    pub fn reviews_value(&self) -> Value {
        Value::Array(
            self.product
                .reviews
                .iter()
                .map(|review| Value::String(review.clone()))
                .collect(),
        )
    }
}
