//! Rolling cache of weather forecast observations.
//!
//! Holds at most one observation per hour-floored timestamp (last write
//! wins) and drops everything older than the start of the current UTC day on
//! every access, so staleness stays bounded regardless of call pattern.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::WeatherObservation;
use crate::forecast::timegrid::start_of_utc_day;

#[derive(Debug, Default)]
pub struct WeatherCache {
    entries: BTreeMap<DateTime<Utc>, WeatherObservation>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge new observations into the cache; for a timestamp present in
    /// both old and new data the new value wins. An empty sequence is a
    /// no-op apart from retention.
    pub fn upsert(&mut self, observations: impl IntoIterator<Item = WeatherObservation>) {
        for obs in observations {
            self.entries.insert(obs.datetime, obs);
        }
        self.evict_stale(Utc::now());
    }

    /// Current contents ordered by timestamp, after applying retention.
    pub fn read(&mut self) -> Vec<WeatherObservation> {
        self.evict_stale(Utc::now());
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_stale(&mut self, now: DateTime<Utc>) {
        let cutoff = start_of_utc_day(now);
        self.entries = self.entries.split_off(&cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn obs(datetime: DateTime<Utc>, cloud_coverage: f64) -> WeatherObservation {
        WeatherObservation {
            datetime,
            cloud_coverage: Some(cloud_coverage),
        }
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let ts = start_of_utc_day(Utc::now()) + Duration::hours(12);
        let mut cache = WeatherCache::new();

        cache.upsert([obs(ts, 30.0)]);
        cache.upsert([obs(ts, 80.0)]);

        let entries = cache.read();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cloud_coverage, Some(80.0));
    }

    #[test]
    fn test_read_is_ordered_by_timestamp() {
        let base = start_of_utc_day(Utc::now());
        let mut cache = WeatherCache::new();
        cache.upsert([
            obs(base + Duration::hours(5), 10.0),
            obs(base + Duration::hours(1), 20.0),
            obs(base + Duration::hours(3), 30.0),
        ]);

        let times: Vec<_> = cache.read().into_iter().map(|o| o.datetime).collect();
        assert_eq!(
            times,
            vec![
                base + Duration::hours(1),
                base + Duration::hours(3),
                base + Duration::hours(5)
            ]
        );
    }

    #[test]
    fn test_stale_entries_dropped_without_explicit_clean() {
        let today = start_of_utc_day(Utc::now());
        let mut cache = WeatherCache::new();
        cache.upsert([
            obs(today - Duration::hours(1), 50.0),
            obs(today, 40.0),
            obs(today + Duration::hours(6), 60.0),
        ]);

        let entries = cache.read();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|o| o.datetime >= today));
    }

    #[test]
    fn test_empty_upsert_is_noop() {
        let mut cache = WeatherCache::new();
        cache.upsert(std::iter::empty());
        assert!(cache.is_empty());
        assert!(cache.read().is_empty());
    }
}
