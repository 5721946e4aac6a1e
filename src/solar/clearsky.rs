//! Clear-sky irradiance and atmospheric helpers.
//!
//! Ineichen-Perez broadband clear-sky model with Kasten-Young airmass and a
//! Spencer eccentricity-corrected extraterrestrial irradiance. References:
//! Ineichen & Perez (2002), Kasten & Young (1989), Spencer (1971).

/// Solar constant used for the Spencer extraterrestrial correction, W/m².
pub const SOLAR_CONSTANT_WM2: f64 = 1366.1;

/// Sea-level reference pressure, Pa.
pub const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;

/// Extraterrestrial direct-normal irradiance for a day of year, W/m².
///
/// Spencer (1971) orbital eccentricity correction; varies about ±3.3% over
/// the year, peaking near perihelion in early January.
pub fn extraterrestrial_radiation(day_of_year: u32) -> f64 {
    let b = 2.0 * std::f64::consts::PI * (day_of_year as f64 - 1.0) / 365.0;
    let eccentricity = 1.000110
        + 0.034221 * b.cos()
        + 0.001280 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin();
    SOLAR_CONSTANT_WM2 * eccentricity
}

/// Relative airmass from the solar zenith angle (Kasten-Young 1989).
///
/// NaN for deep below-horizon angles, mirroring the polynomial's domain;
/// callers zero-fill invalid regimes downstream.
pub fn relative_airmass(zenith_deg: f64) -> f64 {
    let zenith_rad = zenith_deg.to_radians();
    1.0 / (zenith_rad.cos() + 0.50572 * (96.07995 - zenith_deg).powf(-1.6364))
}

/// Scale relative airmass by the site/sea-level pressure ratio.
pub fn absolute_airmass(airmass_relative: f64, pressure_pa: f64) -> f64 {
    airmass_relative * (pressure_pa / SEA_LEVEL_PRESSURE_PA)
}

/// Site pressure from altitude using the ISA barometric formula, Pa.
pub fn pressure_from_altitude(altitude_m: f64) -> f64 {
    SEA_LEVEL_PRESSURE_PA * (1.0 - 2.25577e-5 * altitude_m.clamp(-500.0, 11_000.0)).powf(5.25588)
}

/// Clear-sky (DNI, DHI, GHI) for a sun elevation at a site, W/m².
///
/// All zeros when the sun is at or below the horizon.
pub fn ineichen_clearsky(
    sun_elevation_deg: f64,
    altitude_m: f64,
    day_of_year: u32,
    linke_turbidity: f64,
) -> (f64, f64, f64) {
    if sun_elevation_deg <= 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let zenith_deg = 90.0 - sun_elevation_deg;
    let am = relative_airmass(zenith_deg);
    if !am.is_finite() || am <= 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let i0 = extraterrestrial_radiation(day_of_year);
    let sin_elevation = sun_elevation_deg.to_radians().sin();
    let clamped_alt = altitude_m.clamp(-500.0, 11_000.0);

    // Altitude correction coefficients (Ineichen 2002).
    let fh1 = (-clamped_alt / 8000.0).exp();
    let fh2 = (-clamped_alt / 1250.0).exp();
    let tl = (linke_turbidity - 0.15 * clamped_alt / 1000.0).max(1.0);
    let cg1 = 5.09e-5 * clamped_alt + 0.868;
    let cg2 = 3.92e-5 * clamped_alt + 0.0387;

    let b = 0.664 + 0.163 / fh1;
    let dni = (b * i0 * (-cg2 * am * (fh1 + fh2 * (tl - 1.0))).exp())
        .max(0.0)
        .min(i0);

    let ghi_raw = (cg1 * i0 * sin_elevation * (-cg2 * am * (fh1 + fh2 * (tl - 1.0)) * 1.1).exp())
        .max(0.0);

    // GHI cannot fall below the direct beam projected onto the horizontal.
    let direct_horizontal = dni * sin_elevation;
    let ghi = ghi_raw.max(direct_horizontal);
    let dhi = (ghi - direct_horizontal).max(0.0);

    (dni, dhi, ghi)
}
