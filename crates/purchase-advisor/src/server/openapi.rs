//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use crate::server::analyze;
use crate::server::error::{ApiErrorBody, ApiErrorResponse};
use crate::types::{DetectProductRequest, ProductData};

#[derive(OpenApi)]
#[openapi(
    info(title = "Purchase Advisor API", description = "LLM-driven product review analysis"),
    paths(analyze::health, analyze::detect_product, analyze::recent_analyses),
    components(schemas(ProductData, DetectProductRequest, ApiErrorResponse, ApiErrorBody))
)]
pub struct ApiDoc;
