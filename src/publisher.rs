//! `Publisher` models the external publish contract (alert/state topics with
//! `/insert`, `/remove`, `/loop` subtopics) without pulling in an MQTT
//! client. The console publisher is the one concrete implementation shipped;
//! a real MQTT client would implement the same trait.

use crate::alerts::{Alert, AlertDiff};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct LoopStats {
    pub aircraft_count: usize,
    pub alerts_active: usize,
    pub alerts_inserted: usize,
    pub alerts_removed: usize,
}

pub trait Publisher: Send + Sync {
    fn publish_insert(&self, alert: &Alert);
    fn publish_remove(&self, alert: &Alert);
    fn publish_loop(&self, stats: &LoopStats);
}

impl dyn Publisher {
    pub fn publish_diff(&self, diff: &AlertDiff, stats: &LoopStats) {
        for alert in &diff.inserted {
            self.publish_insert(alert);
        }
        for alert in &diff.removed {
            self.publish_remove(alert);
        }
        self.publish_loop(stats);
    }
}

/// Publishes alert and stats records as structured log lines on stdout.
pub struct ConsolePublisher;

impl Publisher for ConsolePublisher {
    fn publish_insert(&self, alert: &Alert) {
        if alert.warn {
            warn!(
                id = %alert.id, hex = %alert.hex, flight = ?alert.flight, text = %alert.text,
                "alert/insert"
            );
        } else {
            info!(
                id = %alert.id, hex = %alert.hex, flight = ?alert.flight, text = %alert.text,
                "alert/insert"
            );
        }
    }

    fn publish_remove(&self, alert: &Alert) {
        info!(id = %alert.id, hex = %alert.hex, "alert/remove");
    }

    fn publish_loop(&self, stats: &LoopStats) {
        info!(
            aircraft = stats.aircraft_count,
            alerts_active = stats.alerts_active,
            alerts_inserted = stats.alerts_inserted,
            alerts_removed = stats.alerts_removed,
            "state/loop"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_alert() -> Alert {
        Alert {
            id: "aircraft-vicinity-ABC123".into(),
            filter_id: "vicinity",
            hex: "ABC123".into(),
            flight: Some("BAW1".into()),
            text: "nearby".into(),
            warn: false,
            lat: Some(51.5),
            lon: Some(-0.1),
            altitude: Some(1000.0),
            time: Utc::now(),
            time_last: Utc::now(),
        }
    }

    #[test]
    fn console_publisher_does_not_panic_on_insert_and_remove() {
        let publisher = ConsolePublisher;
        let alert = test_alert();
        publisher.publish_insert(&alert);
        publisher.publish_remove(&alert);
        publisher.publish_loop(&LoopStats {
            aircraft_count: 1,
            alerts_active: 1,
            alerts_inserted: 1,
            alerts_removed: 0,
        });
    }
}
