//! Alert lifecycle: insert, refresh, and expire per-(filter,hex) alerts
//! across cycles, and report the insert/remove/active deltas a publisher
//! needs to emit `/insert`, `/remove`, `/loop` events.

use crate::aircraft::Aircraft;
use crate::filters::{AlertContent, FilterRegistry};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

pub const ALERT_EXPIRY_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub filter_id: &'static str,
    pub hex: String,
    pub flight: Option<String>,
    pub text: String,
    pub warn: bool,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude: Option<f64>,
    pub time: DateTime<Utc>,
    pub time_last: DateTime<Utc>,
}

fn alert_id(filter_id: &str, hex: &str) -> String {
    format!("aircraft-{filter_id}-{hex}")
}

#[derive(Default)]
pub struct AlertManager {
    active: DashMap<String, Alert>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertDiff {
    pub inserted: Vec<Alert>,
    pub refreshed: Vec<Alert>,
    pub removed: Vec<Alert>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Diffs one cycle's enriched+sorted aircraft against the active alert
    /// set: every `(filter, hex)` pair where `filter.evaluate(aircraft)` is
    /// true gets its alert inserted or refreshed — an aircraft firing two
    /// filters at once produces two alerts, not one. `firing_filter()`
    /// stays reserved for ranking (`sort_interesting`); it is not used
    /// here. Any alert not touched this cycle expires `ALERT_EXPIRY_TIME`
    /// after its `timeLast`.
    pub fn diff(&self, aircraft: &[Aircraft], registry: &FilterRegistry, now: DateTime<Utc>) -> AlertDiff {
        let mut diff = AlertDiff::default();
        let mut touched = std::collections::HashSet::new();

        for a in aircraft {
            for filter in registry.iter().filter(|f| f.evaluate(a)) {
                let AlertContent { text, warn } = filter.format(a);
                let id = alert_id(filter.id(), &a.hex);
                touched.insert(id.clone());

                if let Some(mut existing) = self.active.get_mut(&id) {
                    existing.time_last = now;
                    existing.text = text;
                    existing.warn = warn;
                    existing.lat = a.lat;
                    existing.lon = a.lon;
                    existing.altitude = a.calculated.altitude;
                    existing.flight = a.flight.clone();
                    diff.refreshed.push(existing.clone());
                } else {
                    let alert = Alert {
                        id: id.clone(),
                        filter_id: filter.id(),
                        hex: a.hex.clone(),
                        flight: a.flight.clone(),
                        text,
                        warn,
                        lat: a.lat,
                        lon: a.lon,
                        altitude: a.calculated.altitude,
                        time: now,
                        time_last: now,
                    };
                    self.active.insert(id, alert.clone());
                    diff.inserted.push(alert);
                }
            }
        }

        let cutoff = now - Duration::seconds(ALERT_EXPIRY_SECS);
        let expired: Vec<String> = self
            .active
            .iter()
            .filter(|entry| !touched.contains(entry.key()) && entry.time_last < cutoff)
            .map(|entry| entry.key().clone())
            .collect();
        for id in expired {
            if let Some((_, alert)) = self.active.remove(&id) {
                diff.removed.push(alert);
            }
        }

        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::EmergencyStatus;
    use crate::config::MilitaryConfig;
    use crate::filters::emergency::EmergencyFilter;
    use crate::filters::military::MilitaryFilter;
    use crate::filters::Filter;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    fn registry() -> FilterRegistry {
        FilterRegistry::new(vec![Box::new(EmergencyFilter)])
    }

    #[test]
    fn alert_inserted_then_refreshed_then_expires() {
        let manager = AlertManager::new();
        let registry = registry();
        let ctx = blank_context();
        let mut a = test_aircraft("A1");
        a.emergency = Some(EmergencyStatus::General);
        EmergencyFilter.preprocess(&mut a, &ctx);

        let now = Utc::now();
        let diff = manager.diff(&[a.clone()], &registry, now);
        assert_eq!(diff.inserted.len(), 1);
        assert_eq!(manager.active_count(), 1);

        let diff2 = manager.diff(&[a.clone()], &registry, now + Duration::seconds(10));
        assert_eq!(diff2.refreshed.len(), 1);
        assert_eq!(diff2.inserted.len(), 0);

        let diff3 = manager.diff(&[], &registry, now + Duration::seconds(ALERT_EXPIRY_SECS + 5));
        assert_eq!(diff3.removed.len(), 1);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn id_format_is_stable() {
        assert_eq!(alert_id("emergency", "ABC123"), "aircraft-emergency-ABC123");
    }

    #[test]
    fn aircraft_firing_two_filters_produces_two_alerts() {
        let manager = AlertManager::new();
        let ctx = blank_context();
        let military = MilitaryFilter::new(&MilitaryConfig { enabled: true, prefixes: vec!["RRR".into()] });
        let registry = FilterRegistry::new(vec![Box::new(EmergencyFilter), Box::new(military)]);

        let mut a = test_aircraft("A1");
        a.emergency = Some(EmergencyStatus::General);
        a.flight = Some("RRR12".to_string());
        registry.preprocess_all(&mut a, &ctx);

        let now = Utc::now();
        let diff = manager.diff(&[a], &registry, now);
        assert_eq!(diff.inserted.len(), 2);
        let mut ids: Vec<&str> = diff.inserted.iter().map(|al| al.filter_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["emergency", "military"]);
    }
}
