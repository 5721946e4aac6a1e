//! Solar position from time and geographic coordinates.
//!
//! Declination/hour-angle formulation with a Saemundsson refraction
//! correction for the apparent zenith. Accuracy is a fraction of a degree,
//! which is ample for hourly irradiance work.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::domain::SolarAngles;

/// Compute solar angles for one UTC timestamp at the given site.
pub fn solar_angles(time: DateTime<Utc>, latitude_deg: f64, longitude_deg: f64) -> SolarAngles {
    let day_of_year = time.ordinal() as f64;
    let hour = time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0;

    // Cooper declination, -23.45° at winter solstice to +23.45° at summer.
    let declination_rad =
        (23.45 * ((360.0 / 365.0) * (day_of_year + 284.0)).to_radians().sin()).to_radians();
    let latitude_rad = latitude_deg.to_radians();

    // Hour angle relative to solar noon; local time meridian is 0 for UTC.
    let solar_time = hour + longitude_deg / 15.0;
    let hour_angle_rad = (15.0 * (solar_time - 12.0)).to_radians();

    let sin_elevation = latitude_rad.sin() * declination_rad.sin()
        + latitude_rad.cos() * declination_rad.cos() * hour_angle_rad.cos();
    let elevation_rad = sin_elevation.clamp(-1.0, 1.0).asin();
    let elevation_deg = elevation_rad.to_degrees();

    // Azimuth from north via atan2, correct in all quadrants.
    let azimuth_deg = f64::atan2(
        hour_angle_rad.sin(),
        hour_angle_rad.cos() * latitude_rad.sin() - declination_rad.tan() * latitude_rad.cos(),
    )
    .to_degrees()
        + 180.0;
    let azimuth_deg = azimuth_deg.rem_euclid(360.0);

    let zenith_deg = 90.0 - elevation_deg;
    let apparent_zenith_deg = zenith_deg - refraction_deg(elevation_deg);

    SolarAngles {
        apparent_zenith_deg,
        zenith_deg,
        azimuth_deg,
    }
}

/// Atmospheric refraction (Saemundsson 1986), degrees.
///
/// Near-zero below the horizon; ~0.5° at the horizon itself.
fn refraction_deg(elevation_deg: f64) -> f64 {
    if elevation_deg < -1.0 {
        return 0.0;
    }
    let arg = (elevation_deg + 10.3 / (elevation_deg + 5.11)).to_radians();
    (1.02 / arg.tan()) / 60.0
}
