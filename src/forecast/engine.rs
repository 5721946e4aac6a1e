//! Forecast pipeline and shared result state.
//!
//! One engine owns the weather cache and collaborators for a single PV
//! array. Each run recomputes the full horizon from scratch and publishes
//! the result atomically; consumers only ever see a complete snapshot.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{AdjustmentMethod, ForecastResult, IrradianceSeries};
use crate::forecast::cache::WeatherCache;
use crate::forecast::irradiance::{adjust_clearsky, align_cloud_cover, AdjustmentParams};
use crate::forecast::timegrid::hourly_grid;
use crate::forecast::weather::{acquire_observations, WeatherService};
use crate::solar::SolarGeometry;

/// Runtime-adjustable array parameters.
#[derive(Debug, Clone)]
pub struct ArrayOptions {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    /// Installed DC capacity at standard test conditions, kW.
    pub installed_kw: f64,
    /// System-wide derate factor (soiling, wiring, conversion).
    pub efficiency: f64,
    /// AC output cap; `None` leaves DC power unclipped.
    pub inverter_kw: Option<f64>,
    /// Weather entity to pull cloud cover from; `None` means pure clear-sky.
    pub weather_entity: Option<String>,
}

/// Latest published forecast plus an availability flag.
///
/// `available` is false before the first successful run and after a failed
/// one; `result` keeps the previous snapshot either way.
#[derive(Debug, Default)]
pub struct ForecastState {
    pub result: Option<Arc<ForecastResult>>,
    pub available: bool,
}

pub type SharedForecast = Arc<RwLock<ForecastState>>;

pub struct ForecastEngine {
    options: ArrayOptions,
    adjustment: AdjustmentMethod,
    params: AdjustmentParams,
    geometry: Box<dyn SolarGeometry>,
    weather: Box<dyn WeatherService>,
    cache: WeatherCache,
    shared: SharedForecast,
}

impl ForecastEngine {
    pub fn new(
        options: ArrayOptions,
        adjustment: AdjustmentMethod,
        params: AdjustmentParams,
        geometry: Box<dyn SolarGeometry>,
        weather: Box<dyn WeatherService>,
    ) -> Self {
        Self {
            options,
            adjustment,
            params,
            geometry,
            weather,
            cache: WeatherCache::new(),
            shared: Arc::new(RwLock::new(ForecastState::default())),
        }
    }

    /// Handle for readers; cheap to clone into API state and tasks.
    pub fn shared(&self) -> SharedForecast {
        Arc::clone(&self.shared)
    }

    pub fn options(&self) -> &ArrayOptions {
        &self.options
    }

    /// Replace the array options. Takes effect on the next run.
    pub fn apply_options(&mut self, options: ArrayOptions) {
        debug!(
            tilt_deg = options.tilt_deg,
            azimuth_deg = options.azimuth_deg,
            installed_kw = options.installed_kw,
            "array options updated"
        );
        self.options = options;
    }

    /// Run the pipeline anchored at the current wall clock.
    pub async fn run_once(&mut self) -> Result<Arc<ForecastResult>> {
        self.run_at(Utc::now()).await
    }

    /// Run the pipeline anchored at `now` and publish the outcome.
    ///
    /// A failed run clears the availability flag but keeps the previous
    /// result readable.
    pub async fn run_at(&mut self, now: DateTime<Utc>) -> Result<Arc<ForecastResult>> {
        match self.compute(now).await {
            Ok(result) => {
                let result = Arc::new(result);
                let mut state = self.shared.write().await;
                state.result = Some(Arc::clone(&result));
                state.available = true;
                info!(points = result.times.len(), "forecast published");
                Ok(result)
            }
            Err(e) => {
                let mut state = self.shared.write().await;
                state.available = false;
                Err(e)
            }
        }
    }

    async fn compute(&mut self, now: DateTime<Utc>) -> Result<ForecastResult> {
        let times = hourly_grid(now);
        let angles = self.geometry.solar_position(&times)?;
        let clearsky = self.geometry.clear_sky(&times)?;

        let irradiance = self.weather_adjusted(&times, &angles, &clearsky).await;

        let poa = self.geometry.plane_of_array(
            self.options.tilt_deg,
            self.options.azimuth_deg,
            &angles,
            &irradiance,
        )?;

        let power_w = self.to_dc_power(&poa);
        Ok(ForecastResult {
            times,
            power_w,
            generated_at: now,
        })
    }

    /// Cloud-adjusted irradiance, falling back to the clear-sky series when
    /// no entity is configured or the weather source is unusable.
    async fn weather_adjusted(
        &mut self,
        times: &[DateTime<Utc>],
        angles: &[crate::domain::SolarAngles],
        clearsky: &IrradianceSeries,
    ) -> IrradianceSeries {
        let Some(entity_id) = self.options.weather_entity.clone() else {
            debug!("no weather entity configured, using clear-sky irradiance");
            return clearsky.clone();
        };

        match acquire_observations(self.weather.as_ref(), &entity_id).await {
            Ok(observations) => {
                self.cache.upsert(observations);
                let cached = self.cache.read();
                let cloud_cover = align_cloud_cover(times, &cached);
                adjust_clearsky(
                    self.adjustment,
                    &self.params,
                    times,
                    angles,
                    clearsky,
                    &cloud_cover,
                )
            }
            Err(e) => {
                warn!(entity_id, error = %e, "weather unavailable, using clear-sky irradiance");
                clearsky.clone()
            }
        }
    }

    fn to_dc_power(&self, poa_global: &[f64]) -> Vec<f64> {
        let max_watts = self.options.inverter_kw.map(|kw| kw * 1000.0);
        poa_global
            .iter()
            .map(|poa| {
                let watts = poa * self.options.installed_kw * self.options.efficiency;
                match max_watts {
                    Some(cap) => watts.clamp(0.0, cap),
                    None => watts.max(0.0),
                }
            })
            .collect()
    }
}
