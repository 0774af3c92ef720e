//! Analysis endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::IntoParams;

use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;
use crate::types::DetectProductRequest;

const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /
///
/// Liveness probe for the extension.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service is alive"))
)]
pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/detect-product
///
/// Analyze a detected product: classify it, run the LLM-planned tool
/// pipeline, and return the synthesized recommendation.
#[utoipa::path(
    post,
    path = "/api/detect-product",
    tag = "analysis",
    request_body = DetectProductRequest,
    responses(
        (status = 200, description = "Synthesized analysis"),
        (status = 400, body = ApiErrorResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn detect_product(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if payload.get("title").and_then(Value::as_str).is_none() {
        return Err(ApiError::bad_request("missing required field: title"));
    }
    let request: DetectProductRequest = serde_json::from_value(payload)
        .map_err(|error| ApiError::bad_request(format!("invalid request body: {error}")))?;

    // Log counts, never review content.
    tracing::info!(
        title = %request.product.title,
        site = request.product.site_or_unknown(),
        review_count = request.product.reviews.len(),
        has_preferences = request.user_preferences.is_some(),
        "received product detection"
    );

    let report = state
        .advisor
        .analyze(request.product, request.user_preferences)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(report))
}

/// GET /api/analyses/recent
///
/// Most recent stored analyses, newest first.
#[utoipa::path(
    get,
    path = "/api/analyses/recent",
    tag = "analysis",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent history entries"),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub(crate) async fn recent_analyses(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let entries = state.history.recent(limit).await.map_err(ApiError::from)?;
    Ok(Json(entries))
}
