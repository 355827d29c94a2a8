use axum::{extract::State, http::StatusCode, routing::get, Router};
use serde_json::json;

use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

/// Process is up; the store is not consulted.
async fn liveness_check() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(StatusCode::OK, "API is live", json!({ "status": "live" }))
}

/// Store answers a trivial call.
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<ApiResponse<serde_json::Value>, ApiResponse<()>> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, backend = state.store.backend_tag(), "readiness check failed");
        ApiResponse::<()>::error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Record store unavailable",
            Some(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "API is ready",
        json!({ "backend": state.store.backend_tag() }),
    ))
}
