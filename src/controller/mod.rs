use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::config::Config;
use crate::forecast::engine::{ArrayOptions, ForecastEngine, SharedForecast};
use crate::forecast::irradiance::AdjustmentParams;
use crate::forecast::weather::HomeAssistantWeather;
use crate::solar::clearsky::pressure_from_altitude;
use crate::solar::SiteGeometry;

/// Bookkeeping for the periodic refresh task.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RefreshStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub engine: Arc<Mutex<ForecastEngine>>,
    pub forecast: SharedForecast,
    pub refresh: Arc<RwLock<RefreshStatus>>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let options = ArrayOptions {
            tilt_deg: cfg.array.tilt_deg,
            azimuth_deg: cfg.array.azimuth_deg,
            installed_kw: cfg.array.installed_kw,
            efficiency: cfg.array.efficiency,
            inverter_kw: cfg.array.inverter_kw,
            weather_entity: cfg.weather.entity_id.clone(),
        };

        let geometry = SiteGeometry::new(
            cfg.site.latitude,
            cfg.site.longitude,
            cfg.site.altitude_m,
        );
        let weather = HomeAssistantWeather::new(
            &cfg.weather.base_url,
            &cfg.weather.token,
            cfg.weather.http_timeout_seconds,
        )?;

        let engine = ForecastEngine::new(
            options,
            cfg.forecast.adjustment()?,
            AdjustmentParams::for_pressure(pressure_from_altitude(cfg.site.altitude_m)),
            Box::new(geometry),
            Box::new(weather),
        );
        let forecast = engine.shared();

        Ok(Self {
            cfg,
            engine: Arc::new(Mutex::new(engine)),
            forecast,
            refresh: Arc::new(RwLock::new(RefreshStatus::default())),
        })
    }
}

/// Run the forecast immediately, then on a fixed cadence.
pub fn spawn_refresh_task(state: AppState) {
    let refresh_minutes = state.cfg.forecast.refresh_minutes;
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(refresh_minutes.max(1) * 60));
        loop {
            ticker.tick().await;
            refresh_once(&state).await;
        }
    });
}

pub async fn refresh_once(state: &AppState) {
    let started = Utc::now();
    {
        let mut status = state.refresh.write().await;
        status.last_run = Some(started);
        status.run_count += 1;
    }

    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.run_once().await
    };

    let mut status = state.refresh.write().await;
    match outcome {
        Ok(result) => {
            status.last_success = Some(Utc::now());
            status.success_count += 1;
            info!(
                points = result.times.len(),
                elapsed_ms = (Utc::now() - started).num_milliseconds(),
                "forecast refresh complete"
            );
        }
        Err(e) => {
            status.last_error = Some(e.to_string());
            status.error_count += 1;
            error!(error = %e, "forecast refresh failed");
        }
    }
}
