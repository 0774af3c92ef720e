use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Product payload received from the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductData {
    pub title: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reviews: Vec<String>,
}

impl ProductData {
    /// Source site, or `"Unknown"` when the extension did not report one.
    pub fn site_or_unknown(&self) -> &str {
        self.site.as_deref().unwrap_or("Unknown")
    }
}

/// Request body for `POST /api/detect-product`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DetectProductRequest {
    #[serde(flatten)]
    pub product: ProductData,
    /// Raw user preferences, merged over defaults before use.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub user_preferences: Option<Value>,
}
