//! Derived readings over a published forecast snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::ForecastResult;
use crate::forecast::timegrid::start_of_utc_day;

/// Power at the grid point nearest to `now`, rounded to whole watts.
///
/// `None` only for an empty snapshot.
pub fn current_power_w(result: &ForecastResult, now: DateTime<Utc>) -> Option<f64> {
    let (mut best, mut best_distance) = (None, None);
    for (i, t) in result.times.iter().enumerate() {
        let distance = (*t - now).num_seconds().abs();
        if best_distance.map_or(true, |d| distance < d) {
            best = Some(i);
            best_distance = Some(distance);
        }
    }
    best.map(|i| result.power_w[i].round())
}

/// Energy over the UTC calendar day containing `day`, Wh, rounded.
///
/// Each hourly power sample stands for one hour of production.
pub fn energy_for_day_wh(result: &ForecastResult, day: DateTime<Utc>) -> f64 {
    let day_start = start_of_utc_day(day);
    result
        .times
        .iter()
        .zip(&result.power_w)
        .filter(|(t, _)| start_of_utc_day(**t) == day_start)
        .map(|(_, p)| p)
        .sum::<f64>()
        .round()
}

/// Per-hour production map for API consumers, watts keyed by grid time.
pub fn wh_period(result: &ForecastResult) -> BTreeMap<DateTime<Utc>, f64> {
    result
        .times
        .iter()
        .copied()
        .zip(result.power_w.iter().copied())
        .collect()
}
