use axum::Json;

use crate::error::ApiResponse;

/// Liveness probe.
pub async fn health_handler() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("ok"))
}
