//! Per-hex rolling trajectory trail and the flight cache that tracks
//! appearance/miss counters across cycles.

use crate::aircraft::{Aircraft, Calculated};
use crate::geometry::calculate_distance;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;

pub const MAX_TRAIL_SIZE: usize = 20;
pub const MAX_TRAIL_AGE_SECS: i64 = 10 * 60;
pub const CACHE_EXPIRY_SECS: i64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct TrailEntry {
    pub timestamp: DateTime<Utc>,
    pub snapshot: Aircraft,
}

#[derive(Debug, Clone, Default)]
pub struct Trail {
    pub entries: VecDeque<TrailEntry>,
}

impl Trail {
    fn push(&mut self, now: DateTime<Utc>, snapshot: Aircraft) {
        self.entries.push_back(TrailEntry { timestamp: now, snapshot });
        let cutoff = now - Duration::seconds(MAX_TRAIL_AGE_SECS);
        while self.entries.front().is_some_and(|e| e.timestamp < cutoff) {
            self.entries.pop_front();
        }
        while self.entries.len() > MAX_TRAIL_SIZE {
            self.entries.pop_front();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Processing {
    pub first_seen: Option<DateTime<Utc>>,
    pub missed_updates: u64,
    pub appearances: u64,
    pub consecutive_misses: u64,
    pub consecutive_appearances: u64,
}

#[derive(Debug, Clone)]
pub struct CachedAircraft {
    pub last: Aircraft,
    pub processing: Processing,
}

/// Owns the per-hex history and last-seen cache. Mutated only by the
/// scheduler's worker; background tasks read through the accessor methods.
#[derive(Default)]
pub struct Tracker {
    history: DashMap<String, Trail>,
    cache: DashMap<String, CachedAircraft>,
}

fn strip_calculated(aircraft: &Aircraft) -> Aircraft {
    let mut stripped = aircraft.clone();
    stripped.calculated = Calculated::default();
    stripped
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one cycle's enriched snapshot: append to each hex's trail,
    /// refresh the cache, bump miss counters for hexes absent this cycle,
    /// then expire anything stale per `CACHE_EXPIRY_TIME`.
    pub fn ingest(&self, aircraft: &[Aircraft], now: DateTime<Utc>) {
        let seen: std::collections::HashSet<&str> =
            aircraft.iter().map(|a| a.hex.as_str()).collect();

        for a in aircraft {
            if !self.history.contains_key(&a.hex) {
                self.history.insert(a.hex.clone(), Trail::default());
            }
            if let Some(mut trail) = self.history.get_mut(&a.hex) {
                trail.push(now, strip_calculated(a));
            }

            if !self.cache.contains_key(&a.hex) {
                self.cache.insert(
                    a.hex.clone(),
                    CachedAircraft {
                        last: a.clone(),
                        processing: Processing {
                            first_seen: Some(now),
                            ..Default::default()
                        },
                    },
                );
            }
            if let Some(mut entry) = self.cache.get_mut(&a.hex) {
                entry.last = a.clone();
                entry.processing.appearances += 1;
                entry.processing.consecutive_appearances += 1;
                entry.processing.consecutive_misses = 0;
            }
        }

        for mut entry in self.cache.iter_mut() {
            if !seen.contains(entry.key().as_str()) {
                entry.processing.missed_updates += 1;
                entry.processing.consecutive_misses += 1;
                entry.processing.consecutive_appearances = 0;
            }
        }

        let cutoff = now - Duration::seconds(CACHE_EXPIRY_SECS);
        let expired: Vec<String> = self
            .cache
            .iter()
            .filter(|entry| {
                entry
                    .last
                    .calculated
                    .timestamp_updated
                    .map(|t| t < cutoff)
                    .unwrap_or(false)
            })
            .map(|entry| entry.key().clone())
            .collect();
        for hex in expired {
            self.cache.remove(&hex);
            self.history.remove(&hex);
        }
    }

    pub fn trail_len(&self, hex: &str) -> usize {
        self.history.get(hex).map(|t| t.entries.len()).unwrap_or(0)
    }

    pub fn cached(&self, hex: &str) -> Option<CachedAircraft> {
        self.cache.get(hex).map(|e| e.clone())
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Accessor handed to filters needing trajectory data: `get_field`,
    /// `get_positions`, `get_direction_changes`, `get_stats`, all reading
    /// from the trail built up to, but not including, the current cycle.
    pub fn data_for<'a>(&'a self, hex: &str, current: &'a Aircraft) -> AircraftData<'a> {
        let trail = self.history.get(hex).map(|t| t.clone()).unwrap_or_default();
        AircraftData { trail, current }
    }
}

pub struct AircraftData<'a> {
    trail: Trail,
    current: &'a Aircraft,
}

impl<'a> AircraftData<'a> {
    /// Numeric field values + timestamps from the trail, plus the current
    /// value appended when it differs from the last trail entry. Returns
    /// `None` if fewer than `min_data_points` values are available.
    pub fn get_field(
        &self,
        extract: impl Fn(&Aircraft) -> Option<f64>,
        min_data_points: usize,
    ) -> Option<(Vec<f64>, Vec<DateTime<Utc>>)> {
        let mut values = Vec::new();
        let mut timestamps = Vec::new();
        for entry in &self.trail.entries {
            if let Some(v) = extract(&entry.snapshot) {
                values.push(v);
                timestamps.push(entry.timestamp);
            }
        }
        if let Some(v) = extract(self.current) {
            if values.last().copied() != Some(v) {
                values.push(v);
                timestamps.push(self.current.calculated.timestamp_updated.unwrap_or_else(Utc::now));
            }
        }
        if values.len() < min_data_points {
            return None;
        }
        Some((values, timestamps))
    }

    pub fn get_positions(&self, max_data_points: usize) -> Vec<(f64, f64)> {
        let mut positions: Vec<(f64, f64)> = self
            .trail
            .entries
            .iter()
            .filter_map(|e| Some((e.snapshot.lat?, e.snapshot.lon?)))
            .collect();
        if let (Some(lat), Some(lon)) = (self.current.lat, self.current.lon) {
            positions.push((lat, lon));
        }
        if positions.len() > max_data_points {
            let skip = positions.len() - max_data_points;
            positions.drain(0..skip);
        }
        positions
    }

    /// Count of direction reversals in a field's trail, counting only
    /// changes whose magnitude exceeds `min_delta`.
    pub fn get_direction_changes(
        &self,
        extract: impl Fn(&Aircraft) -> Option<f64>,
        min_delta: f64,
    ) -> usize {
        let Some((values, _)) = self.get_field(extract, 2) else {
            return 0;
        };
        let mut changes = 0;
        let mut last_sign: Option<i8> = None;
        for window in values.windows(2) {
            let delta = window[1] - window[0];
            if delta.abs() < min_delta {
                continue;
            }
            let sign = if delta > 0.0 { 1 } else { -1 };
            if let Some(prev) = last_sign {
                if prev != sign {
                    changes += 1;
                }
            }
            last_sign = Some(sign);
        }
        changes
    }

    pub fn get_stats(&self, extract: impl Fn(&Aircraft) -> Option<f64>) -> crate::geometry::Stats {
        let values: Vec<f64> = self
            .trail
            .entries
            .iter()
            .filter_map(|e| extract(&e.snapshot))
            .collect();
        crate::geometry::calculate_stats(&values)
    }

    pub fn sample_count(&self) -> usize {
        self.trail.entries.len()
    }

    /// Maximum pairwise haversine distance between positions in the trail,
    /// used by the loitering filter to bound geographic extent.
    pub fn max_spread_km(&self, max_data_points: usize) -> f64 {
        let positions = self.get_positions(max_data_points);
        let mut max_km: f64 = 0.0;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if let Ok(d) = calculate_distance(
                    positions[i].0,
                    positions[i].1,
                    positions[j].0,
                    positions[j].1,
                ) {
                    max_km = max_km.max(d);
                }
            }
        }
        max_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;

    fn now_plus(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        base + Duration::seconds(secs)
    }

    #[test]
    fn s6_trajectory_ring_bounds_to_max_size() {
        let tracker = Tracker::new();
        let base = Utc::now();
        for i in 0..25 {
            let mut a = test_aircraft("D");
            a.calculated.timestamp_updated = Some(now_plus(base, i));
            tracker.ingest(&[a], now_plus(base, i));
        }
        assert_eq!(tracker.trail_len("D"), MAX_TRAIL_SIZE);
    }

    #[test]
    fn cache_expires_after_timeout() {
        let tracker = Tracker::new();
        let base = Utc::now();
        let mut a = test_aircraft("E");
        a.calculated.timestamp_updated = Some(base);
        tracker.ingest(&[a], base);
        assert!(tracker.cached("E").is_some());

        tracker.ingest(&[], base + Duration::seconds(CACHE_EXPIRY_SECS + 1));
        assert!(tracker.cached("E").is_none());
    }

    #[test]
    fn missed_update_counters_increment() {
        let tracker = Tracker::new();
        let base = Utc::now();
        let mut a = test_aircraft("F");
        a.calculated.timestamp_updated = Some(base);
        tracker.ingest(&[a], base);

        tracker.ingest(&[], base + Duration::seconds(10));
        let cached = tracker.cached("F").unwrap();
        assert_eq!(cached.processing.missed_updates, 1);
        assert_eq!(cached.processing.consecutive_misses, 1);
        assert_eq!(cached.processing.consecutive_appearances, 0);
    }
}
