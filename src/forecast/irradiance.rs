//! Cloud-cover-to-irradiance adjustment.
//!
//! Two empirical models turn a percent cloud-cover series into GHI/DNI/DHI
//! on the forecast grid: clear-sky scaling (linear GHI attenuation plus the
//! DISC decomposition for DNI) and Campbell-Norman (transmittance-based,
//! independent of the clear-sky series except for solar position).

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::domain::{AdjustmentMethod, IrradianceSeries, SolarAngles, WeatherObservation};
use crate::solar::clearsky::{absolute_airmass, extraterrestrial_radiation, relative_airmass};

/// GHI floor under full cloud, percent of clear-sky GHI.
const GHI_LINEAR_OFFSET_PCT: f64 = 35.0;

/// Atmospheric transmittance of a cloudless sky in the Campbell-Norman model.
const MAX_TRANSMITTANCE: f64 = 0.75;

/// Direct-normal extraterrestrial irradiance for Campbell-Norman, W/m².
const CAMPBELL_DNI_EXTRA: f64 = 1367.0;

/// Airmass cap; beyond this the empirical fits are extrapolating anyway.
const MAX_AIRMASS: f64 = 12.0;

/// Zenith cutoff for the DISC decomposition, degrees.
const MAX_ZENITH_DEG: f64 = 87.0;

/// Cosine-zenith floor for the clearness index near the horizon.
const MIN_COS_ZENITH: f64 = 0.065;

/// Upper clamp on the clearness index.
const MAX_CLEARNESS_INDEX: f64 = 2.0;

/// Tuning knobs for the adjustment models.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentParams {
    pub ghi_offset_pct: f64,
    pub max_transmittance: f64,
    /// Site pressure for absolute airmass, Pa.
    pub pressure_pa: f64,
}

impl AdjustmentParams {
    pub fn for_pressure(pressure_pa: f64) -> Self {
        Self {
            ghi_offset_pct: GHI_LINEAR_OFFSET_PCT,
            max_transmittance: MAX_TRANSMITTANCE,
            pressure_pa,
        }
    }
}

/// Align cached observations onto the forecast grid as a percent series.
///
/// A grid hour with no observation, or an observation without a cloud-cover
/// value, counts as 0% (fully clear). This biases missing data toward
/// overprediction, which is the conservative direction for consumers that
/// curtail on surplus.
pub fn align_cloud_cover(
    times: &[DateTime<Utc>],
    observations: &[WeatherObservation],
) -> Vec<f64> {
    let mut aligned = vec![0.0; times.len()];
    let mut matched = 0usize;
    for obs in observations {
        if let Ok(i) = times.binary_search(&obs.datetime) {
            aligned[i] = obs.cloud_coverage.unwrap_or(0.0).clamp(0.0, 100.0);
            matched += 1;
        }
    }
    if matched < times.len() {
        debug!(
            matched,
            grid = times.len(),
            "grid hours without weather data treated as clear"
        );
    }
    aligned
}

/// Convert cloud cover into irradiance on the grid, sanitized.
pub fn adjust_clearsky(
    method: AdjustmentMethod,
    params: &AdjustmentParams,
    times: &[DateTime<Utc>],
    angles: &[SolarAngles],
    clearsky: &IrradianceSeries,
    cloud_cover_pct: &[f64],
) -> IrradianceSeries {
    let mut series = match method {
        AdjustmentMethod::ClearskyScaling => {
            clearsky_scaling(params, times, angles, clearsky, cloud_cover_pct)
        }
        AdjustmentMethod::CampbellNorman => {
            campbell_norman(params, angles, cloud_cover_pct)
        }
    };
    series.sanitize();
    series
}

/// Scale clear-sky GHI linearly with cloud cover, then recover DNI via DISC
/// and DHI by closure.
fn clearsky_scaling(
    params: &AdjustmentParams,
    times: &[DateTime<Utc>],
    angles: &[SolarAngles],
    clearsky: &IrradianceSeries,
    cloud_cover_pct: &[f64],
) -> IrradianceSeries {
    let mut series = IrradianceSeries::with_capacity(times.len());
    for i in 0..times.len() {
        let ghi = cloud_cover_to_ghi_linear(
            cloud_cover_pct[i],
            clearsky.ghi[i],
            params.ghi_offset_pct,
        );
        let zenith_deg = angles[i].apparent_zenith_deg;
        let dni = disc_dni(ghi, zenith_deg, times[i].ordinal(), params.pressure_pa);
        let dhi = ghi - dni * zenith_deg.to_radians().cos();
        series.push(ghi, dni, dhi);
    }
    series
}

/// Campbell-Norman: cloud cover sets a bulk transmittance, beam decays with
/// airmass, and a fixed fraction of what the clouds absorb comes back as
/// diffuse.
fn campbell_norman(
    params: &AdjustmentParams,
    angles: &[SolarAngles],
    cloud_cover_pct: &[f64],
) -> IrradianceSeries {
    let mut series = IrradianceSeries::with_capacity(angles.len());
    for (a, cc) in angles.iter().zip(cloud_cover_pct) {
        let cos_zenith = a.apparent_zenith_deg.to_radians().cos();
        if cos_zenith <= 0.0 {
            series.push(0.0, 0.0, 0.0);
            continue;
        }
        let tau = cloud_cover_to_transmittance_linear(*cc, params.max_transmittance);
        // NaN airmass (deep below horizon) resolves to the cap under f64::min.
        let am = absolute_airmass(relative_airmass(a.apparent_zenith_deg), params.pressure_pa)
            .min(MAX_AIRMASS);
        let beam_fraction = tau.powf(am);
        let dni = CAMPBELL_DNI_EXTRA * beam_fraction;
        let dhi = 0.3 * (1.0 - beam_fraction) * CAMPBELL_DNI_EXTRA * cos_zenith;
        let ghi = dni * cos_zenith + dhi;
        series.push(ghi, dni, dhi);
    }
    series
}

/// Linear attenuation of clear-sky GHI: full clear-sky at 0% cloud, the
/// offset fraction of it at 100%.
pub fn cloud_cover_to_ghi_linear(cloud_cover_pct: f64, ghi_clear: f64, offset_pct: f64) -> f64 {
    let offset = offset_pct / 100.0;
    ghi_clear * (offset + (1.0 - offset) * (1.0 - cloud_cover_pct / 100.0))
}

/// Linear cloud-cover-to-transmittance mapping.
pub fn cloud_cover_to_transmittance_linear(cloud_cover_pct: f64, max_transmittance: f64) -> f64 {
    (1.0 - cloud_cover_pct / 100.0) * max_transmittance
}

/// Clearness index: GHI over the horizontal extraterrestrial irradiance,
/// with a cosine floor near the horizon and clamped to [0, 2].
pub fn clearness_index(ghi: f64, zenith_deg: f64, dni_extra: f64) -> f64 {
    let cos_zenith = zenith_deg.to_radians().cos().max(MIN_COS_ZENITH);
    (ghi / (dni_extra * cos_zenith)).clamp(0.0, MAX_CLEARNESS_INDEX)
}

/// DISC decomposition: estimate DNI from GHI (Maxwell 1987).
///
/// Returns 0 past the zenith cutoff or when the polynomial fit goes
/// negative.
pub fn disc_dni(ghi: f64, zenith_deg: f64, day_of_year: u32, pressure_pa: f64) -> f64 {
    let dni_extra = extraterrestrial_radiation(day_of_year);
    let kt = clearness_index(ghi, zenith_deg, dni_extra);

    // NaN airmass resolves to the cap under f64::min.
    let airmass = absolute_airmass(relative_airmass(zenith_deg), pressure_pa).min(MAX_AIRMASS);

    let dni = disc_kn(kt, airmass) * dni_extra;
    if zenith_deg > MAX_ZENITH_DEG || kt < 0.0 || dni < 0.0 {
        0.0
    } else {
        dni
    }
}

/// Direct-beam atmospheric transmittance Kn for DISC, as a deficit below the
/// clear-sky transmittance Knc. Piecewise cubic fits split at kt = 0.6.
fn disc_kn(kt: f64, airmass: f64) -> f64 {
    let (a, b, c) = if kt <= 0.6 {
        (
            0.512 + kt * (-1.56 + kt * (2.286 - 2.222 * kt)),
            0.37 + 0.962 * kt,
            -0.28 + kt * (0.932 - 2.048 * kt),
        )
    } else {
        (
            -5.743 + kt * (21.77 + kt * (-27.49 + 11.56 * kt)),
            41.4 + kt * (-118.5 + kt * (66.05 + 31.9 * kt)),
            -47.01 + kt * (184.2 + kt * (-222.0 + 73.81 * kt)),
        )
    };
    let delta_kn = a + b * (c * airmass).exp();
    let knc = 0.866
        + airmass * (-0.122 + airmass * (0.0121 + airmass * (-0.000653 + 1.4e-5 * airmass)));
    knc - delta_kn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::clearsky::pressure_from_altitude;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rstest::rstest;

    fn day_angles(n: usize) -> Vec<SolarAngles> {
        (0..n)
            .map(|_| SolarAngles {
                apparent_zenith_deg: 40.0,
                zenith_deg: 40.0,
                azimuth_deg: 180.0,
            })
            .collect()
    }

    #[test]
    fn test_align_defaults_missing_hours_to_clear() {
        let base = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..4).map(|h| base + Duration::hours(h)).collect();
        let observations = vec![
            WeatherObservation {
                datetime: base + Duration::hours(1),
                cloud_coverage: Some(60.0),
            },
            WeatherObservation {
                datetime: base + Duration::hours(2),
                cloud_coverage: None,
            },
            // Off-grid timestamp is ignored.
            WeatherObservation {
                datetime: base + Duration::days(30),
                cloud_coverage: Some(90.0),
            },
        ];

        let aligned = align_cloud_cover(&times, &observations);
        assert_eq!(aligned, vec![0.0, 60.0, 0.0, 0.0]);
    }

    #[rstest]
    #[case(0.0, 800.0)]
    #[case(50.0, 540.0)]
    #[case(100.0, 280.0)]
    fn test_ghi_linear_attenuation(#[case] cloud_cover_pct: f64, #[case] expected: f64) {
        let ghi = cloud_cover_to_ghi_linear(cloud_cover_pct, 800.0, 35.0);
        assert!((ghi - expected).abs() < 1e-9, "ghi {ghi}");
    }

    #[test]
    fn test_clearness_index_horizon_floor() {
        // Near the horizon the cosine floor keeps kt bounded.
        let kt = clearness_index(50.0, 89.9, 1366.0);
        assert!(kt > 0.0 && kt <= 2.0);
        assert_eq!(clearness_index(1e6, 0.0, 1366.0), 2.0);
        assert_eq!(clearness_index(0.0, 40.0, 1366.0), 0.0);
    }

    #[test]
    fn test_disc_clear_midday() {
        let pressure = pressure_from_altitude(0.0);
        // Clear-sky-like GHI at moderate zenith gives a strong beam.
        let dni = disc_dni(850.0, 30.0, 172, pressure);
        assert!(dni > 500.0 && dni < 1100.0, "dni {dni}");
    }

    #[test]
    fn test_disc_zero_past_zenith_cutoff() {
        let pressure = pressure_from_altitude(0.0);
        assert_eq!(disc_dni(100.0, 88.0, 172, pressure), 0.0);
        assert_eq!(disc_dni(100.0, 120.0, 172, pressure), 0.0);
    }

    #[test]
    fn test_disc_monotone_in_ghi() {
        let pressure = pressure_from_altitude(0.0);
        let low = disc_dni(200.0, 40.0, 172, pressure);
        let high = disc_dni(800.0, 40.0, 172, pressure);
        assert!(high > low, "high {high} low {low}");
    }

    proptest! {
        #[test]
        fn prop_disc_dni_bounded(
            ghi in 0.0..1200.0f64,
            zenith_deg in 0.0..87.0f64,
            day_of_year in 1u32..366,
        ) {
            let pressure = pressure_from_altitude(0.0);
            let dni = disc_dni(ghi, zenith_deg, day_of_year, pressure);
            let dni_extra = extraterrestrial_radiation(day_of_year);
            prop_assert!(dni >= 0.0);
            prop_assert!(dni <= dni_extra, "dni {} extra {}", dni, dni_extra);
        }
    }

    #[test]
    fn test_clearsky_scaling_fully_clear_matches_clearsky_ghi() {
        let times = vec![Utc.with_ymd_and_hms(2024, 6, 21, 19, 0, 0).unwrap()];
        let angles = day_angles(1);
        let clearsky = IrradianceSeries {
            ghi: vec![800.0],
            dni: vec![850.0],
            dhi: vec![100.0],
        };
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));

        let out = adjust_clearsky(
            AdjustmentMethod::ClearskyScaling,
            &params,
            &times,
            &angles,
            &clearsky,
            &[0.0],
        );
        assert!((out.ghi[0] - 800.0).abs() < 1e-6);
        // Closure holds after decomposition.
        let recomposed = out.dni[0] * 40.0_f64.to_radians().cos() + out.dhi[0];
        assert!((out.ghi[0] - recomposed).abs() < 1e-6);
    }

    #[test]
    fn test_clearsky_scaling_overcast_attenuates() {
        let times = vec![Utc.with_ymd_and_hms(2024, 6, 21, 19, 0, 0).unwrap()];
        let angles = day_angles(1);
        let clearsky = IrradianceSeries {
            ghi: vec![800.0],
            dni: vec![850.0],
            dhi: vec![100.0],
        };
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));

        let clear = adjust_clearsky(
            AdjustmentMethod::ClearskyScaling,
            &params,
            &times,
            &angles,
            &clearsky,
            &[0.0],
        );
        let overcast = adjust_clearsky(
            AdjustmentMethod::ClearskyScaling,
            &params,
            &times,
            &angles,
            &clearsky,
            &[100.0],
        );
        assert!(overcast.ghi[0] < clear.ghi[0]);
        assert!((overcast.ghi[0] - 280.0).abs() < 1e-6);
        assert!(overcast.dni[0] < clear.dni[0]);
    }

    #[test]
    fn test_campbell_norman_clear_vs_overcast() {
        let angles = day_angles(1);
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));
        let clearsky = IrradianceSeries::default();
        let times: Vec<DateTime<Utc>> = vec![Utc.with_ymd_and_hms(2024, 6, 21, 19, 0, 0).unwrap()];

        let clear = adjust_clearsky(
            AdjustmentMethod::CampbellNorman,
            &params,
            &times,
            &angles,
            &clearsky,
            &[0.0],
        );
        let overcast = adjust_clearsky(
            AdjustmentMethod::CampbellNorman,
            &params,
            &times,
            &angles,
            &clearsky,
            &[100.0],
        );

        assert!(clear.dni[0] > 400.0, "clear beam {}", clear.dni[0]);
        // Zero transmittance kills the beam but leaves cloud-scattered diffuse.
        assert_eq!(overcast.dni[0], 0.0);
        assert!(overcast.dhi[0] > 0.0);
        assert!(overcast.ghi[0] < clear.ghi[0]);
    }

    #[test]
    fn test_campbell_norman_monotone_in_cloud_cover() {
        let angles = day_angles(1);
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));
        let times: Vec<DateTime<Utc>> = vec![Utc.with_ymd_and_hms(2024, 6, 21, 19, 0, 0).unwrap()];

        let mut previous: Option<(f64, f64)> = None;
        for cc in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let out = adjust_clearsky(
                AdjustmentMethod::CampbellNorman,
                &params,
                &times,
                &angles,
                &IrradianceSeries::default(),
                &[cc],
            );
            if let Some((prev_dni, prev_ghi)) = previous {
                assert!(out.dni[0] <= prev_dni, "dni rose at cc {cc}");
                assert!(out.ghi[0] <= prev_ghi, "ghi rose at cc {cc}");
            }
            previous = Some((out.dni[0], out.ghi[0]));
        }
    }

    #[test]
    fn test_campbell_norman_night_is_zero() {
        let angles = vec![SolarAngles {
            apparent_zenith_deg: 110.0,
            zenith_deg: 110.0,
            azimuth_deg: 0.0,
        }];
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));
        let times: Vec<DateTime<Utc>> = vec![Utc.with_ymd_and_hms(2024, 6, 21, 7, 0, 0).unwrap()];

        let out = adjust_clearsky(
            AdjustmentMethod::CampbellNorman,
            &params,
            &times,
            &angles,
            &IrradianceSeries::default(),
            &[0.0],
        );
        assert_eq!((out.ghi[0], out.dni[0], out.dhi[0]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_adjust_output_never_negative() {
        let times = vec![Utc.with_ymd_and_hms(2024, 6, 21, 2, 0, 0).unwrap()];
        let angles = vec![SolarAngles {
            apparent_zenith_deg: 120.0,
            zenith_deg: 120.0,
            azimuth_deg: 10.0,
        }];
        let clearsky = IrradianceSeries {
            ghi: vec![0.0],
            dni: vec![0.0],
            dhi: vec![0.0],
        };
        let params = AdjustmentParams::for_pressure(pressure_from_altitude(0.0));

        for method in [AdjustmentMethod::ClearskyScaling, AdjustmentMethod::CampbellNorman] {
            let out = adjust_clearsky(method, &params, &times, &angles, &clearsky, &[50.0]);
            assert!(out.ghi[0] >= 0.0 && out.dni[0] >= 0.0 && out.dhi[0] >= 0.0);
        }
    }
}
