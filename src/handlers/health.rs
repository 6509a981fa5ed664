use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::services::ServiceHealthStatus;

use super::AppState;

/// Unauthenticated liveness and store health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
