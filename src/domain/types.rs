use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One cloud-cover forecast row, keyed by its hour-floored UTC timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub datetime: DateTime<Utc>,
    /// Cloud cover in percent (0-100). Absent when the source omits it.
    pub cloud_coverage: Option<f64>,
}

/// Forecast resolution offered by a weather source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ForecastResolution {
    Hourly,
    Daily,
}

/// Cloud-cover-to-irradiance adjustment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMethod {
    ClearskyScaling,
    CampbellNorman,
}

/// Solar position at one grid timestamp, all angles in degrees.
///
/// Azimuth is measured from north, eastward (90 = east, 180 = south).
#[derive(Debug, Clone, Copy)]
pub struct SolarAngles {
    pub apparent_zenith_deg: f64,
    pub zenith_deg: f64,
    pub azimuth_deg: f64,
}

/// GHI/DNI/DHI series aligned 1:1 with a time grid, W/m².
#[derive(Debug, Clone, Default)]
pub struct IrradianceSeries {
    pub ghi: Vec<f64>,
    pub dni: Vec<f64>,
    pub dhi: Vec<f64>,
}

impl IrradianceSeries {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            ghi: Vec::with_capacity(n),
            dni: Vec::with_capacity(n),
            dhi: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.ghi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghi.is_empty()
    }

    pub fn push(&mut self, ghi: f64, dni: f64, dhi: f64) {
        self.ghi.push(ghi);
        self.dni.push(dni);
        self.dhi.push(dhi);
    }

    /// Replace NaN, infinite, and negative values with 0.
    ///
    /// Degenerate trig and near-zero divisions in the empirical models mark
    /// physically invalid regimes, not errors.
    pub fn sanitize(&mut self) {
        for series in [&mut self.ghi, &mut self.dni, &mut self.dhi] {
            for v in series.iter_mut() {
                if !v.is_finite() || *v < 0.0 {
                    *v = 0.0;
                }
            }
        }
    }
}

/// Immutable snapshot of one successful forecast run.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Hourly UTC time grid, start of today through +7 days.
    pub times: Vec<DateTime<Utc>>,
    /// DC power per grid timestamp, watts.
    pub power_w: Vec<f64>,
    pub generated_at: DateTime<Utc>,
}
