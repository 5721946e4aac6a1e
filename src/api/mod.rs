pub mod forecast;
pub mod health;

use axum::routing::{get, put};
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/forecast", get(forecast::get_forecast))
        .route("/api/v1/summary", get(forecast::get_summary))
        .route("/api/v1/status", get(forecast::get_status))
        .route("/api/v1/options", put(forecast::put_options))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .layer(TraceLayer::new_for_http())
}
