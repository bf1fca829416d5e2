//! Priority 1: aircraft-proximity incidents outside any airport ATZ.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::airport::FindNearbyOpts;
use crate::config::AirproxConfig;
use crate::geometry::{calculate_distance, closure_geometry, TrackState};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Serialize)]
pub struct AirproxCalc {
    pub other_hex: String,
    pub category: RiskCategory,
    pub horizontal_nm: f64,
    pub vertical_ft: f64,
    pub closure_rate_kt: f64,
    pub time_to_cpa_s: f64,
}

pub struct AirproxFilter {
    horizontal_threshold_nm: f64,
    vertical_threshold_ft: f64,
}

impl AirproxFilter {
    pub fn new(conf: &AirproxConfig) -> Self {
        Self {
            horizontal_threshold_nm: conf.horizontal_threshold,
            vertical_threshold_ft: conf.vertical_threshold,
        }
    }
}

fn in_any_atz(ctx: &FilterContext, lat: f64, lon: f64, altitude_ft: f64) -> bool {
    !ctx.airports
        .find_nearby(lat, lon, FindNearbyOpts { distance_km: None, altitude_ft: Some(altitude_ft) })
        .is_empty()
}

fn categorize(horizontal_nm: f64, vertical_ft: f64, closure_rate_kt: f64) -> RiskCategory {
    let mut category = if horizontal_nm < 0.25 && vertical_ft < 500.0 {
        RiskCategory::A
    } else if horizontal_nm < 0.5 && vertical_ft < 500.0 {
        RiskCategory::B
    } else if horizontal_nm < 1.0 {
        RiskCategory::C
    } else {
        RiskCategory::D
    };
    if closure_rate_kt > 400.0 {
        category = match category {
            RiskCategory::D => RiskCategory::C,
            RiskCategory::C => RiskCategory::B,
            RiskCategory::B => RiskCategory::A,
            RiskCategory::A => RiskCategory::A,
        };
    }
    category
}

impl Filter for AirproxFilter {
    fn id(&self) -> &'static str {
        "airprox"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn preprocess(&self, _aircraft: &mut Aircraft, _ctx: &FilterContext) {
        // All of the work here is pairwise; see `preprocess_batch`.
    }

    fn preprocess_batch(&self, aircraft: &mut [Aircraft], ctx: &FilterContext) {
        let candidates: Vec<(usize, f64, f64, f64, f64, f64)> = aircraft
            .iter()
            .enumerate()
            .filter_map(|(i, a)| {
                let lat = a.lat?;
                let lon = a.lon?;
                let alt = a.calculated.altitude?;
                let track = a.track?;
                let gs = a.gs?;
                if in_any_atz(ctx, lat, lon, alt) {
                    return None;
                }
                Some((i, lat, lon, alt, track, gs))
            })
            .collect();

        let mut best: Vec<Option<AirproxCalc>> = vec![None; aircraft.len()];

        for &(i, lat1, lon1, alt1, track1, gs1) in &candidates {
            let mut closest: Option<(f64, AirproxCalc)> = None;
            for &(j, lat2, lon2, alt2, track2, gs2) in &candidates {
                if i == j {
                    continue;
                }
                let Ok(horizontal_km) = calculate_distance(lat1, lon1, lat2, lon2) else { continue };
                let horizontal_nm = horizontal_km / 1.852;
                let vertical_ft = (alt1 - alt2).abs();
                if horizontal_nm > self.horizontal_threshold_nm || vertical_ft > self.vertical_threshold_ft {
                    continue;
                }
                let Ok(closure) = closure_geometry(
                    TrackState { lat: lat1, lon: lon1, track_deg: track1, gs_kt: gs1 },
                    TrackState { lat: lat2, lon: lon2, track_deg: track2, gs_kt: gs2 },
                ) else {
                    continue;
                };
                let category = categorize(horizontal_nm, vertical_ft, closure.closure_rate_kt);
                let calc = AirproxCalc {
                    other_hex: aircraft[j].hex.clone(),
                    category,
                    horizontal_nm,
                    vertical_ft,
                    closure_rate_kt: closure.closure_rate_kt,
                    time_to_cpa_s: closure.time_to_cpa_s,
                };
                if closest.as_ref().is_none_or(|(d, _)| horizontal_nm < *d) {
                    closest = Some((horizontal_nm, calc));
                }
            }
            if let Some((_, calc)) = closest {
                best[i] = Some(calc);
            }
        }

        for (i, calc) in best.into_iter().enumerate() {
            aircraft[i].calculated.airprox = calc;
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.airprox.is_some()
    }

    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let (Some(ca), Some(cb)) = (&a.calculated.airprox, &b.calculated.airprox) else {
            return Ordering::Equal;
        };
        ca.category
            .cmp(&cb.category)
            .then_with(|| ca.horizontal_nm.total_cmp(&cb.horizontal_nm))
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.airprox else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!(
                "airprox category {:?} with {}: {:.2} NM / {:.0} ft, closing {:.0} kt",
                calc.category, calc.other_hex, calc.horizontal_nm, calc.vertical_ft, calc.closure_rate_kt
            ),
            warn: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    fn pair() -> Vec<Aircraft> {
        let mut a = test_aircraft("A");
        a.lat = Some(51.5);
        a.lon = Some(-0.14);
        a.calculated.altitude = Some(2000.0);
        a.track = Some(90.0);
        a.gs = Some(100.0);

        let mut b = test_aircraft("B");
        // ~0.3 NM east, 300 ft apart.
        b.lat = Some(51.5);
        b.lon = Some(-0.14 + 0.3 * 1.852 / 111.32);
        b.calculated.altitude = Some(2300.0);
        b.track = Some(270.0);
        b.gs = Some(100.0);

        vec![a, b]
    }

    #[test]
    fn s4_airprox_pair_category_a() {
        let mut aircraft = pair();
        let filter = AirproxFilter::new(&AirproxConfig::default());
        let ctx = blank_context();
        filter.preprocess_batch(&mut aircraft, &ctx);

        let calc_a = aircraft[0].calculated.airprox.as_ref().unwrap();
        let calc_b = aircraft[1].calculated.airprox.as_ref().unwrap();
        assert_eq!(calc_a.other_hex, "B");
        assert_eq!(calc_b.other_hex, "A");
        assert_eq!(calc_a.category, RiskCategory::A);
    }

    #[test]
    fn no_candidate_beyond_threshold() {
        let mut a = test_aircraft("A");
        a.lat = Some(51.5);
        a.lon = Some(-0.14);
        a.calculated.altitude = Some(2000.0);
        a.track = Some(90.0);
        a.gs = Some(100.0);
        let mut aircraft = vec![a];
        let filter = AirproxFilter::new(&AirproxConfig::default());
        filter.preprocess_batch(&mut aircraft, &blank_context());
        assert!(aircraft[0].calculated.airprox.is_none());
    }
}
