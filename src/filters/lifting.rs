//! Priority 2: climb rate + a weighted "lifting score", symmetric to landing.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::LiftingConfig;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LiftingCalc {
    pub score: f64,
}

pub struct LiftingFilter {
    min_climb_rate_ft_min: f64,
    altitude_max_ft: f64,
    radius_max_km: f64,
}

impl LiftingFilter {
    pub fn new(conf: &LiftingConfig) -> Self {
        Self {
            min_climb_rate_ft_min: conf.min_climb_rate,
            altitude_max_ft: conf.altitude,
            radius_max_km: conf.radius,
        }
    }
}

fn lifting_score(climb_rate: f64, alt_ft: f64, gs: f64) -> f64 {
    let climb_weight = if alt_ft < 3000.0 { 2.0 } else { 1.0 };
    let speed_weight = if gs > 50.0 && gs < 250.0 { 1.2 } else { 0.8 };
    (climb_weight * climb_rate / 100.0) * (1.0 - (alt_ft / 10_000.0).min(1.0)) * speed_weight
}

impl Filter for LiftingFilter {
    fn id(&self) -> &'static str {
        "lifting"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn preprocess(&self, aircraft: &mut Aircraft, _ctx: &FilterContext) {
        let (Some(baro_rate), Some(alt), Some(gs)) =
            (aircraft.baro_rate, aircraft.calculated.altitude, aircraft.gs)
        else {
            return;
        };
        if baro_rate < self.min_climb_rate_ft_min {
            return;
        }
        if alt > self.altitude_max_ft {
            return;
        }
        if aircraft.calculated.distance.is_none_or(|d| d > self.radius_max_km) {
            return;
        }
        aircraft.calculated.lifting = Some(LiftingCalc { score: lifting_score(baro_rate, alt, gs) });
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.lifting.as_ref().is_some_and(|l| l.score >= 3.0)
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let score = aircraft.calculated.lifting.as_ref().map(|l| l.score).unwrap_or(0.0);
        AlertContent {
            text: format!("lifting score {score:.2}"),
            warn: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    #[test]
    fn strong_climb_low_altitude_fires() {
        let mut a = test_aircraft("A");
        a.baro_rate = Some(1500.0);
        a.calculated.altitude = Some(500.0);
        a.calculated.distance = Some(1.0);
        a.gs = Some(100.0);

        let filter = LiftingFilter::new(&LiftingConfig::default());
        filter.preprocess(&mut a, &blank_context());
        assert!(filter.evaluate(&a), "{:?}", a.calculated.lifting);
    }

    #[test]
    fn weak_climb_does_not_fire() {
        let mut a = test_aircraft("A");
        a.baro_rate = Some(250.0);
        a.calculated.altitude = Some(9000.0);
        a.calculated.distance = Some(1.0);
        a.gs = Some(300.0);

        let filter = LiftingFilter::new(&LiftingConfig::default());
        filter.preprocess(&mut a, &blank_context());
        assert!(!filter.evaluate(&a));
    }

    #[test]
    fn altitude_above_configured_ceiling_does_not_fire() {
        let mut a = test_aircraft("A");
        a.baro_rate = Some(1500.0);
        a.calculated.altitude = Some(12_000.0);
        a.calculated.distance = Some(1.0);
        a.gs = Some(100.0);

        let filter = LiftingFilter::new(&LiftingConfig { altitude: 10_000.0, ..LiftingConfig::default() });
        filter.preprocess(&mut a, &blank_context());
        assert!(!filter.evaluate(&a));
    }

    #[test]
    fn beyond_configured_radius_does_not_fire() {
        let mut a = test_aircraft("A");
        a.baro_rate = Some(1500.0);
        a.calculated.altitude = Some(500.0);
        a.calculated.distance = Some(50.0);
        a.gs = Some(100.0);

        let filter = LiftingFilter::new(&LiftingConfig::default());
        filter.preprocess(&mut a, &blank_context());
        assert!(!filter.evaluate(&a));
    }
}
