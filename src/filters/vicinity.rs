//! Priority 4: simple distance+altitude proximity, always a warning.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::VicinityConfig;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize)]
pub struct VicinityCalc {
    pub distance_km: f64,
}

pub struct VicinityFilter {
    distance_km: f64,
    altitude_ft: f64,
}

impl VicinityFilter {
    pub fn new(conf: &VicinityConfig) -> Self {
        Self { distance_km: conf.distance, altitude_ft: conf.altitude }
    }
}

impl Filter for VicinityFilter {
    fn id(&self) -> &'static str {
        "vicinity"
    }

    fn priority(&self) -> u8 {
        4
    }

    fn preprocess(&self, aircraft: &mut Aircraft, _ctx: &FilterContext) {
        if let Some(distance) = aircraft.calculated.distance {
            aircraft.calculated.vicinity = Some(VicinityCalc { distance_km: distance });
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        let Some(distance) = aircraft.calculated.distance else { return false };
        let Some(altitude) = aircraft.calculated.altitude else { return false };
        distance <= self.distance_km && altitude <= self.altitude_ft
    }

    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let da = a.calculated.vicinity.as_ref().map(|v| v.distance_km).unwrap_or(f64::MAX);
        let db = b.calculated.vicinity.as_ref().map(|v| v.distance_km).unwrap_or(f64::MAX);
        da.total_cmp(&db)
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let distance = aircraft.calculated.vicinity.as_ref().map(|v| v.distance_km).unwrap_or(0.0);
        AlertContent {
            text: format!("vicinity: {distance:.2} km from station"),
            warn: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    #[test]
    fn s1_vicinity_single_aircraft() {
        let mut a = test_aircraft("A");
        a.calculated.distance = Some(1.11);
        a.calculated.altitude = Some(1500.0);
        let filter = VicinityFilter::new(&VicinityConfig::default());
        filter.preprocess(&mut a, &blank_context());
        assert!(filter.evaluate(&a));
        let content = filter.format(&a);
        assert!(content.warn);
    }

    #[test]
    fn beyond_distance_does_not_fire() {
        let mut a = test_aircraft("A");
        a.calculated.distance = Some(50.0);
        a.calculated.altitude = Some(1500.0);
        let filter = VicinityFilter::new(&VicinityConfig::default());
        filter.preprocess(&mut a, &blank_context());
        assert!(!filter.evaluate(&a));
    }
}
