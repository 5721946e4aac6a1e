//! Plane-of-array transposition for a fixed tilted panel.
//!
//! Isotropic sky-diffuse model: beam by angle of incidence, sky diffuse by
//! the dome view factor, ground-reflected by albedo.

use crate::domain::SolarAngles;

/// Plane-of-array irradiance components, W/m².
#[derive(Debug, Clone, Copy, Default)]
pub struct PoaComponents {
    pub global: f64,
    pub direct: f64,
    pub sky_diffuse: f64,
    pub ground_diffuse: f64,
}

/// Angle of incidence between the sun and the panel normal, degrees.
pub fn angle_of_incidence(
    sun_zenith_deg: f64,
    sun_azimuth_deg: f64,
    panel_tilt_deg: f64,
    panel_azimuth_deg: f64,
) -> f64 {
    let zenith = sun_zenith_deg.to_radians();
    let tilt = panel_tilt_deg.to_radians();
    let azimuth_delta = (sun_azimuth_deg - panel_azimuth_deg).to_radians();

    let cos_aoi = zenith.cos() * tilt.cos() + zenith.sin() * tilt.sin() * azimuth_delta.cos();
    cos_aoi.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Transpose horizontal irradiance components onto the tilted array.
pub fn plane_of_array(
    angles: &SolarAngles,
    ghi: f64,
    dni: f64,
    dhi: f64,
    panel_tilt_deg: f64,
    panel_azimuth_deg: f64,
    albedo: f64,
) -> PoaComponents {
    let aoi_deg = angle_of_incidence(
        angles.apparent_zenith_deg,
        angles.azimuth_deg,
        panel_tilt_deg,
        panel_azimuth_deg,
    );
    let cos_aoi = aoi_deg.to_radians().cos();
    let tilt_rad = panel_tilt_deg.to_radians();

    let sun_up = angles.apparent_zenith_deg < 90.0;
    let direct = if cos_aoi > 0.0 && sun_up { dni * cos_aoi } else { 0.0 };

    let sky_diffuse = dhi * (1.0 + tilt_rad.cos()) / 2.0;
    let ground_diffuse = ghi * albedo * (1.0 - tilt_rad.cos()) / 2.0;

    PoaComponents {
        global: direct + sky_diffuse + ground_diffuse,
        direct,
        sky_diffuse,
        ground_diffuse,
    }
}
