//! Solar geometry and clear-sky provider.
//!
//! The forecast engine treats geometry as an already-correct collaborator
//! behind [`SolarGeometry`]; [`SiteGeometry`] is the built-in implementation.

pub mod clearsky;
pub mod poa;
pub mod position;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};

use crate::domain::{IrradianceSeries, SolarAngles};

/// Default Linke turbidity for a reasonably clear atmosphere.
const DEFAULT_LINKE_TURBIDITY: f64 = 3.0;

/// Default ground albedo (grass/soil).
const DEFAULT_ALBEDO: f64 = 0.2;

/// Geometry and clear-sky computations for a fixed site, aligned to a time
/// grid supplied by the caller.
pub trait SolarGeometry: Send + Sync {
    /// Solar position for every grid timestamp.
    fn solar_position(&self, times: &[DateTime<Utc>]) -> Result<Vec<SolarAngles>>;

    /// Cloudless-sky GHI/DNI/DHI for every grid timestamp.
    fn clear_sky(&self, times: &[DateTime<Utc>]) -> Result<IrradianceSeries>;

    /// Global plane-of-array irradiance for a fixed tilted panel.
    fn plane_of_array(
        &self,
        panel_tilt_deg: f64,
        panel_azimuth_deg: f64,
        angles: &[SolarAngles],
        irradiance: &IrradianceSeries,
    ) -> Result<Vec<f64>>;
}

/// Built-in geometry provider for one installation site.
#[derive(Debug, Clone)]
pub struct SiteGeometry {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
    linke_turbidity: f64,
    albedo: f64,
}

impl SiteGeometry {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
            linke_turbidity: DEFAULT_LINKE_TURBIDITY,
            albedo: DEFAULT_ALBEDO,
        }
    }
}

impl SolarGeometry for SiteGeometry {
    fn solar_position(&self, times: &[DateTime<Utc>]) -> Result<Vec<SolarAngles>> {
        Ok(times
            .iter()
            .map(|t| position::solar_angles(*t, self.latitude_deg, self.longitude_deg))
            .collect())
    }

    fn clear_sky(&self, times: &[DateTime<Utc>]) -> Result<IrradianceSeries> {
        let mut series = IrradianceSeries::with_capacity(times.len());
        for t in times {
            let angles = position::solar_angles(*t, self.latitude_deg, self.longitude_deg);
            let elevation_deg = 90.0 - angles.apparent_zenith_deg;
            let (dni, dhi, ghi) = clearsky::ineichen_clearsky(
                elevation_deg,
                self.altitude_m,
                t.ordinal(),
                self.linke_turbidity,
            );
            series.push(ghi, dni, dhi);
        }
        Ok(series)
    }

    fn plane_of_array(
        &self,
        panel_tilt_deg: f64,
        panel_azimuth_deg: f64,
        angles: &[SolarAngles],
        irradiance: &IrradianceSeries,
    ) -> Result<Vec<f64>> {
        anyhow::ensure!(
            angles.len() == irradiance.len(),
            "solar position and irradiance series differ in length: {} vs {}",
            angles.len(),
            irradiance.len()
        );
        Ok(angles
            .iter()
            .enumerate()
            .map(|(i, a)| {
                poa::plane_of_array(
                    a,
                    irradiance.ghi[i],
                    irradiance.dni[i],
                    irradiance.dhi[i],
                    panel_tilt_deg,
                    panel_azimuth_deg,
                    self.albedo,
                )
                .global
            })
            .collect())
    }
}
