use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::AdjustmentMethod;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub array: ArrayConfig,
    pub forecast: ForecastConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig { pub host: String, pub port: u16 }
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Fixed installation site.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

/// PV array geometry and capacity; adjustable at runtime through the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayConfig {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub installed_kw: f64,
    pub efficiency: f64,
    pub inverter_kw: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    pub refresh_minutes: u64,
    pub adjustment_method: String,
}

impl ForecastConfig {
    pub fn adjustment(&self) -> Result<AdjustmentMethod, ConfigError> {
        AdjustmentMethod::from_str(&self.adjustment_method).map_err(|_| {
            ConfigError::OutOfRange {
                field: "forecast.adjustment_method",
                value: self.adjustment_method.clone(),
                expected: "clearsky_scaling or campbell_norman",
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    /// Home Assistant base URL, e.g. http://homeassistant.local:8123
    pub base_url: String,
    pub token: String,
    pub entity_id: Option<String>,
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("PVF__").split("__"));
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot produce sane output for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn range(
            field: &'static str,
            value: f64,
            lo: f64,
            hi: f64,
            expected: &'static str,
        ) -> Result<(), ConfigError> {
            if value < lo || value > hi {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: value.to_string(),
                    expected,
                });
            }
            Ok(())
        }

        range("site.latitude", self.site.latitude, -90.0, 90.0, "-90..=90")?;
        range("site.longitude", self.site.longitude, -180.0, 180.0, "-180..=180")?;
        range("array.tilt_deg", self.array.tilt_deg, 0.0, 90.0, "0..=90")?;
        range("array.azimuth_deg", self.array.azimuth_deg, 0.0, 360.0, "0..=360")?;
        range("array.efficiency", self.array.efficiency, 0.0, 1.0, "0..=1")?;
        if self.array.installed_kw <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "array.installed_kw",
                value: self.array.installed_kw.to_string(),
                expected: "> 0",
            });
        }
        if let Some(kw) = self.array.inverter_kw {
            if kw <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "array.inverter_kw",
                    value: kw.to_string(),
                    expected: "> 0",
                });
            }
        }
        if self.forecast.refresh_minutes == 0 {
            return Err(ConfigError::OutOfRange {
                field: "forecast.refresh_minutes",
                value: "0".into(),
                expected: ">= 1",
            });
        }
        self.forecast.adjustment()?;
        Ok(())
    }
}
