//! Priority 3: aircraft tracking toward an overhead pass of the station.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::OverheadConfig;
use crate::geometry::{calculate_cross_track_distance, calculate_vertical_angle, knots_to_km_per_min};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OverheadCalc {
    pub will_intersect_overhead: bool,
    pub overhead_future: bool,
    pub time_to_overhead_s: f64,
    pub slant_range_km: f64,
    pub vertical_angle_deg: f64,
}

pub struct OverheadFilter {
    radius_km: f64,
    window_s: f64,
    distance_max_km: Option<f64>,
    altitude_max_ft: Option<f64>,
}

impl OverheadFilter {
    pub fn new(conf: &OverheadConfig) -> Self {
        Self {
            radius_km: conf.radius,
            window_s: conf.time,
            distance_max_km: conf.distance,
            altitude_max_ft: conf.altitude,
        }
    }
}

impl Filter for OverheadFilter {
    fn id(&self) -> &'static str {
        "overhead"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let (Some(lat), Some(lon), Some(track), Some(gs), Some(alt)) =
            (aircraft.lat, aircraft.lon, aircraft.track, aircraft.gs, aircraft.calculated.altitude)
        else {
            return;
        };
        if self.distance_max_km.is_some_and(|max| aircraft.calculated.distance.is_none_or(|d| d > max)) {
            return;
        }
        if self.altitude_max_ft.is_some_and(|max| alt > max) {
            return;
        }
        let Ok(cross) =
            calculate_cross_track_distance(ctx.station_lat, ctx.station_lon, lat, lon, track)
        else {
            return;
        };

        let overhead_future = cross.is_approaching;
        let speed_km_per_min = knots_to_km_per_min(gs);
        let time_to_overhead_s = if speed_km_per_min > 1e-6 {
            (cross.along_track / speed_km_per_min) * 60.0
        } else {
            f64::INFINITY
        };

        let will_intersect_overhead =
            overhead_future && cross.cross_track.abs() <= self.radius_km && time_to_overhead_s <= self.window_s;

        let slant_range_km = (cross.cross_track.powi(2) + cross.along_track.powi(2)).sqrt();
        let vertical_angle_deg =
            calculate_vertical_angle(slant_range_km, alt, ctx.station_lat).unwrap_or(0.0);

        aircraft.calculated.overhead = Some(OverheadCalc {
            will_intersect_overhead,
            overhead_future,
            time_to_overhead_s,
            slant_range_km,
            vertical_angle_deg,
        });
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft
            .calculated
            .overhead
            .as_ref()
            .is_some_and(|o| o.will_intersect_overhead)
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.overhead else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!(
                "overhead pass in {:.0}s, slant range {:.2} km, elevation {:.1} deg",
                calc.time_to_overhead_s, calc.slant_range_km, calc.vertical_angle_deg
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

    #[test]
    fn approaching_overhead_fires() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.lat = Some(ctx.station_lat + 0.05);
        a.lon = Some(ctx.station_lon);
        a.track = Some(180.0);
        a.gs = Some(150.0);
        a.calculated.altitude = Some(3000.0);

        let filter = OverheadFilter::new(&OverheadConfig { radius: 10.0, time: 600.0, ..OverheadConfig::default() });
        filter.preprocess(&mut a, &ctx);
        assert!(filter.evaluate(&a), "{:?}", a.calculated.overhead);
    }

    #[test]
    fn altitude_above_configured_ceiling_does_not_fire() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.lat = Some(ctx.station_lat + 0.05);
        a.lon = Some(ctx.station_lon);
        a.track = Some(180.0);
        a.gs = Some(150.0);
        a.calculated.altitude = Some(12_000.0);

        let filter = OverheadFilter::new(&OverheadConfig {
            radius: 10.0,
            time: 600.0,
            altitude: Some(5000.0),
            ..OverheadConfig::default()
        });
        filter.preprocess(&mut a, &ctx);
        assert!(!filter.evaluate(&a));
    }

    #[test]
    fn beyond_configured_distance_does_not_fire() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.lat = Some(ctx.station_lat + 0.05);
        a.lon = Some(ctx.station_lon);
        a.track = Some(180.0);
        a.gs = Some(150.0);
        a.calculated.altitude = Some(3000.0);
        a.calculated.distance = Some(50.0);

        let filter = OverheadFilter::new(&OverheadConfig {
            radius: 10.0,
            time: 600.0,
            distance: Some(5.0),
            ..OverheadConfig::default()
        });
        filter.preprocess(&mut a, &ctx);
        assert!(!filter.evaluate(&a));
    }

    #[test]
    fn receding_aircraft_does_not_fire() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.lat = Some(ctx.station_lat + 0.05);
        a.lon = Some(ctx.station_lon);
        a.track = Some(0.0);
        a.gs = Some(150.0);
        a.calculated.altitude = Some(3000.0);

        let filter = OverheadFilter::new(&OverheadConfig::default());
        filter.preprocess(&mut a, &ctx);
        assert!(!filter.evaluate(&a));
    }
}
