//! Uniform hourly UTC time grid for the forecast horizon.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Forecast horizon in days beyond the start of the current day.
pub const HORIZON_DAYS: i64 = 7;

/// Floor a timestamp to the top of its hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Midnight at the start of the timestamp's UTC calendar day.
pub fn start_of_utc_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    floor_to_hour(ts) - Duration::hours(i64::from(ts.hour()))
}

/// Hourly grid from the start of "now"'s UTC day through +7 days, endpoints
/// inclusive: exactly `24 * 7 + 1` strictly increasing timestamps.
pub fn hourly_grid(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let start = start_of_utc_day(now);
    let end = start + Duration::days(HORIZON_DAYS);

    let mut times = Vec::with_capacity((24 * HORIZON_DAYS + 1) as usize);
    let mut t = start;
    while t <= end {
        times.push(t);
        t += Duration::hours(1);
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_grid_shape_for_fixed_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 42, 7).unwrap();
        let grid = hourly_grid(now);

        assert_eq!(grid.len(), 24 * 7 + 1);
        assert_eq!(grid[0], Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
        assert_eq!(
            *grid.last().unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 22, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_grid_uniform_hourly_spacing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let grid = hourly_grid(now);
        for pair in grid.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(1));
        }
    }

    #[test]
    fn test_floor_to_hour() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 13, 59, 59).unwrap();
        assert_eq!(
            floor_to_hour(ts),
            Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_start_of_utc_day() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap();
        assert_eq!(
            start_of_utc_day(ts),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }
}
