use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::controller::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    forecast_available: bool,
    refresh_runs: u64,
    refresh_errors: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let forecast_available = state.forecast.read().await.available;
    let refresh = state.refresh.read().await.clone();

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        forecast_available,
        refresh_runs: refresh.run_count,
        refresh_errors: refresh.error_count,
    })
}
