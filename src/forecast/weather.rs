//! Weather forecast acquisition.
//!
//! The engine pulls cloud-cover forecasts from a weather entity exposed by a
//! Home Assistant instance: the entity's `supported_features` bitmask tells
//! us which forecast resolution it offers, and the `weather.get_forecasts`
//! service call returns the entries. Any failure along the way collapses
//! into a typed [`WeatherUnavailable`] so the orchestrator's clear-sky
//! fallback is an explicit branch rather than a catch-all.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ForecastResolution, WeatherObservation};
use crate::forecast::timegrid::{floor_to_hour, start_of_utc_day};

/// Feature-flag bits on a weather entity's state.
pub const SUPPORT_FORECAST_DAILY: u32 = 1;
pub const SUPPORT_FORECAST_HOURLY: u32 = 2;

/// Why no usable weather data could be produced for a run.
#[derive(Debug, Error)]
pub enum WeatherUnavailable {
    #[error("weather entity state not available: {0}")]
    EntityUnavailable(String),
    #[error("weather entity supports neither hourly nor daily forecasts")]
    UnsupportedResolution,
    #[error("forecast fetch failed: {0}")]
    Fetch(String),
    #[error("malformed forecast payload: {0}")]
    MalformedPayload(String),
}

/// External source of cloud-cover forecasts for one weather entity.
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Feature-flag bitmask of the entity's current state.
    async fn supported_features(&self, entity_id: &str) -> Result<u32, WeatherUnavailable>;

    /// Fetch the forecast at the requested resolution. Timestamps come back
    /// as delivered by the source; callers normalize them.
    async fn fetch_forecast(
        &self,
        entity_id: &str,
        resolution: ForecastResolution,
    ) -> Result<Vec<WeatherObservation>, WeatherUnavailable>;
}

/// Discover the supported resolution, fetch, and normalize to hourly rows.
///
/// Hourly forecasts are preferred; daily forecasts are synthesized into 24
/// hourly copies per day. Every returned timestamp is floored to the hour.
pub async fn acquire_observations(
    service: &dyn WeatherService,
    entity_id: &str,
) -> Result<Vec<WeatherObservation>, WeatherUnavailable> {
    let features = service.supported_features(entity_id).await?;
    debug!(entity_id, features, "weather entity features");

    let resolution = if features & SUPPORT_FORECAST_HOURLY != 0 {
        ForecastResolution::Hourly
    } else if features & SUPPORT_FORECAST_DAILY != 0 {
        ForecastResolution::Daily
    } else {
        return Err(WeatherUnavailable::UnsupportedResolution);
    };

    let mut entries = service.fetch_forecast(entity_id, resolution).await?;
    for entry in &mut entries {
        entry.datetime = floor_to_hour(entry.datetime);
    }

    if resolution == ForecastResolution::Daily {
        entries = expand_daily_to_hourly(&entries);
    }

    debug!(entity_id, %resolution, count = entries.len(), "fetched weather forecast");
    Ok(entries)
}

/// Expand daily observations into 24 hourly copies covering each entry's
/// UTC calendar day, half-open (the following midnight is excluded).
///
/// Cloud cover is uniform across the synthesized day; no diurnal shaping is
/// attempted.
pub fn expand_daily_to_hourly(daily: &[WeatherObservation]) -> Vec<WeatherObservation> {
    daily
        .iter()
        .flat_map(|entry| {
            let day_start = start_of_utc_day(entry.datetime);
            let cloud_coverage = entry.cloud_coverage;
            (0..24).map(move |h| WeatherObservation {
                datetime: day_start + ChronoDuration::hours(h),
                cloud_coverage,
            })
        })
        .collect()
}

/// Home Assistant REST client for weather entities.
pub struct HomeAssistantWeather {
    client: Client,
    base_url: String,
    token: String,
}

impl HomeAssistantWeather {
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EntityState {
    state: String,
    #[serde(default)]
    attributes: EntityAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct EntityAttributes {
    #[serde(default)]
    supported_features: u32,
}

#[derive(Debug, Deserialize)]
struct GetForecastsResponse {
    service_response: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EntityForecast {
    forecast: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    datetime: DateTime<Utc>,
    #[serde(default)]
    cloud_coverage: Option<f64>,
}

#[async_trait]
impl WeatherService for HomeAssistantWeather {
    async fn supported_features(&self, entity_id: &str) -> Result<u32, WeatherUnavailable> {
        let url = format!("{}/api/states/{}", self.base_url, entity_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| WeatherUnavailable::Fetch(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(WeatherUnavailable::EntityUnavailable(entity_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(WeatherUnavailable::Fetch(format!(
                "state request returned {}",
                response.status()
            )));
        }

        let state: EntityState = response
            .json()
            .await
            .map_err(|e| WeatherUnavailable::MalformedPayload(e.to_string()))?;

        if state.state == "unavailable" || state.state == "unknown" {
            return Err(WeatherUnavailable::EntityUnavailable(entity_id.to_string()));
        }

        Ok(state.attributes.supported_features)
    }

    async fn fetch_forecast(
        &self,
        entity_id: &str,
        resolution: ForecastResolution,
    ) -> Result<Vec<WeatherObservation>, WeatherUnavailable> {
        let url = format!(
            "{}/api/services/weather/get_forecasts?return_response",
            self.base_url
        );
        let body = json!({ "entity_id": entity_id, "type": resolution.to_string() });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WeatherUnavailable::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherUnavailable::Fetch(format!(
                "get_forecasts returned {}",
                response.status()
            )));
        }

        let payload: GetForecastsResponse = response
            .json()
            .await
            .map_err(|e| WeatherUnavailable::MalformedPayload(e.to_string()))?;

        let entity = payload.service_response.get(entity_id).ok_or_else(|| {
            WeatherUnavailable::MalformedPayload(format!(
                "no forecast for {entity_id} in service response"
            ))
        })?;
        let forecast: EntityForecast = serde_json::from_value(entity.clone())
            .map_err(|e| WeatherUnavailable::MalformedPayload(e.to_string()))?;

        Ok(forecast
            .forecast
            .into_iter()
            .map(|entry| WeatherObservation {
                datetime: entry.datetime,
                cloud_coverage: entry.cloud_coverage,
            })
            .collect())
    }
}
