//! Forecast read endpoints and runtime option updates.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::{refresh_once, AppState, RefreshStatus};
use crate::forecast::summary::{current_power_w, energy_for_day_wh, wh_period};

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub generated_at: DateTime<Utc>,
    /// Watts per grid hour, keyed by UTC timestamp.
    pub wh_period: BTreeMap<DateTime<Utc>, f64>,
}

/// GET /api/v1/forecast
pub async fn get_forecast(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.forecast.read().await;
    match &snapshot.result {
        Some(result) => (
            StatusCode::OK,
            Json(serde_json::json!(ForecastResponse {
                generated_at: result.generated_at,
                wh_period: wh_period(result),
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "no forecast yet" })),
        ),
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub available: bool,
    pub power_now_w: Option<f64>,
    pub energy_today_wh: f64,
    pub energy_tomorrow_wh: f64,
}

/// GET /api/v1/summary
pub async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.forecast.read().await;
    match &snapshot.result {
        Some(result) => {
            let now = Utc::now();
            (
                StatusCode::OK,
                Json(serde_json::json!(SummaryResponse {
                    available: snapshot.available,
                    power_now_w: current_power_w(result, now),
                    energy_today_wh: energy_for_day_wh(result, now),
                    energy_tomorrow_wh: energy_for_day_wh(result, now + Duration::days(1)),
                })),
            )
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "no forecast yet" })),
        ),
    }
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.refresh.read().await.clone())
}

/// Partial update of the array options; omitted fields keep their value.
#[derive(Debug, Deserialize)]
pub struct OptionsUpdate {
    pub tilt_deg: Option<f64>,
    pub azimuth_deg: Option<f64>,
    pub installed_kw: Option<f64>,
    pub efficiency: Option<f64>,
    pub inverter_kw: Option<f64>,
    pub weather_entity: Option<String>,
}

/// PUT /api/v1/options
///
/// Applies the update and recomputes the forecast before responding.
pub async fn put_options(
    State(state): State<AppState>,
    Json(update): Json<OptionsUpdate>,
) -> impl IntoResponse {
    {
        let mut engine = state.engine.lock().await;
        let mut options = engine.options().clone();
        if let Some(v) = update.tilt_deg {
            options.tilt_deg = v;
        }
        if let Some(v) = update.azimuth_deg {
            options.azimuth_deg = v;
        }
        if let Some(v) = update.installed_kw {
            options.installed_kw = v;
        }
        if let Some(v) = update.efficiency {
            options.efficiency = v;
        }
        if let Some(v) = update.inverter_kw {
            options.inverter_kw = Some(v);
        }
        if let Some(v) = update.weather_entity {
            options.weather_entity = Some(v);
        }
        engine.apply_options(options);
    }

    refresh_once(&state).await;

    let available = state.forecast.read().await.available;
    if available {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
