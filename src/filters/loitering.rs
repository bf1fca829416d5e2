//! Priority 5: station-keeping detection. Fires when an aircraft holds a
//! near-constant heading over a window of updates while staying within a
//! small geographic radius — an aircraft circling a point sweeps its
//! heading through the full compass and will *not* trip this predicate;
//! that's a distinct pattern this filter does not attempt to recognize.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::LoiteringConfig;
use serde::Serialize;

const MIN_SAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LoiteringCalc {
    pub track_std_dev_deg: f64,
    pub spread_km: f64,
}

pub struct LoiteringFilter {
    window: usize,
    track_variance_max: f64,
    radius_max_km: f64,
}

impl LoiteringFilter {
    pub fn new(conf: &LoiteringConfig) -> Self {
        Self {
            window: conf.window,
            track_variance_max: conf.track_variance_max,
            radius_max_km: conf.radius_max,
        }
    }
}

/// Circular standard deviation in degrees, via the mean resultant length of
/// unit vectors on the compass rose. Bearings wrap at 360, so a plain
/// arithmetic stddev over e.g. [350, 10] would wrongly read as widely spread.
fn circular_std_dev_deg(degrees: &[f64]) -> f64 {
    let n = degrees.len() as f64;
    let (sum_sin, sum_cos) = degrees.iter().fold((0.0, 0.0), |(s, c), d| {
        let rad = d.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let r = ((sum_sin / n).powi(2) + (sum_cos / n).powi(2)).sqrt();
    let r = r.clamp(0.0, 1.0);
    (-2.0 * r.ln()).max(0.0).sqrt().to_degrees()
}

impl Filter for LoiteringFilter {
    fn id(&self) -> &'static str {
        "loitering"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
        let Some((tracks, _)) = data.get_field(|a| a.track, self.window.max(MIN_SAMPLES)) else {
            return;
        };
        let recent = &tracks[tracks.len().saturating_sub(self.window)..];
        if recent.len() < MIN_SAMPLES {
            return;
        }
        let std_dev = circular_std_dev_deg(recent);
        if std_dev > self.track_variance_max {
            return;
        }
        let spread = data.max_spread_km(self.window);
        if spread > self.radius_max_km {
            return;
        }
        aircraft.calculated.loitering = Some(LoiteringCalc { track_std_dev_deg: std_dev, spread_km: spread });
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.loitering.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.loitering else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!(
                "loitering, track stddev {:.1} deg within {:.2} km",
                calc.track_std_dev_deg, calc.spread_km
            ),
            warn: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;
    use chrono::{Duration, Utc};

    #[test]
    fn steady_heading_in_small_area_fires() {
        let conf = LoiteringConfig { enabled: true, window: 6, track_variance_max: 40.0, radius_max: 5.0 };
        let filter = LoiteringFilter::new(&conf);
        let ctx = blank_context();
        let base = Utc::now();
        let headings = [10.0, 12.0, 15.0, 11.0, 14.0, 9.0];
        for (i, h) in headings.iter().enumerate() {
            let mut a = test_aircraft("L");
            a.track = Some(*h);
            a.lat = Some(51.0 + (i as f64) * 0.0005);
            a.lon = Some(-0.5);
            a.calculated.timestamp_updated = Some(base + Duration::seconds(i as i64));
            ctx.tracker.ingest(&[a], base + Duration::seconds(i as i64));
        }
        let mut current = test_aircraft("L");
        current.track = Some(10.0);
        current.lat = Some(51.0);
        current.lon = Some(-0.5);
        filter.preprocess(&mut current, &ctx);
        assert!(filter.evaluate(&current));
    }

    #[test]
    fn straight_line_heading_does_not_fire() {
        let conf = LoiteringConfig::default();
        let filter = LoiteringFilter::new(&conf);
        let ctx = blank_context();
        let base = Utc::now();
        for i in 0..6 {
            let mut a = test_aircraft("M");
            a.track = Some(90.0);
            a.lat = Some(51.0);
            a.lon = Some(-0.5 + (i as f64) * 0.2);
            a.calculated.timestamp_updated = Some(base + Duration::seconds(i as i64));
            ctx.tracker.ingest(&[a], base + Duration::seconds(i as i64));
        }
        let mut current = test_aircraft("M");
        current.track = Some(90.0);
        current.lat = Some(51.0);
        current.lon = Some(0.7);
        filter.preprocess(&mut current, &ctx);
        assert!(!filter.evaluate(&current));
    }
}
