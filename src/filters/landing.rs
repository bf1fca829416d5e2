//! Priority 2: descent rate + projected ground point near the station.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::airport::FindNearbyOpts;
use crate::config::LandingConfig;
use crate::geometry::project_position;
use serde::Serialize;

fn min_descent_rate_ft_min(aircraft: &Aircraft) -> f64 {
    match aircraft.category {
        Some(c) if c.is_heavy() => -300.0,
        Some(c) if c.is_rotorcraft() => -100.0,
        _ => -200.0,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingCalc {
    pub is_possible_landing: bool,
    pub matched_airport: Option<String>,
    pub ground_point: (f64, f64),
}

pub struct LandingFilter {
    radius_km: f64,
    distance_max_km: Option<f64>,
    altitude_max_ft: Option<f64>,
}

impl LandingFilter {
    pub fn new(conf: &LandingConfig) -> Self {
        Self {
            radius_km: conf.radius,
            distance_max_km: conf.distance,
            altitude_max_ft: conf.altitude,
        }
    }
}

impl Filter for LandingFilter {
    fn id(&self) -> &'static str {
        "landing"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let (Some(lat), Some(lon), Some(track), Some(baro_rate), Some(alt)) =
            (aircraft.lat, aircraft.lon, aircraft.track, aircraft.baro_rate, aircraft.calculated.altitude)
        else {
            return;
        };
        if baro_rate > min_descent_rate_ft_min(aircraft) {
            return;
        }
        if self.distance_max_km.is_some_and(|max| aircraft.calculated.distance.is_none_or(|d| d > max)) {
            return;
        }
        if self.altitude_max_ft.is_some_and(|max| alt > max) {
            return;
        }

        let gs = aircraft.gs.unwrap_or(0.0);
        let time_to_ground_min = if baro_rate < 0.0 { alt / (-baro_rate) } else { 0.0 };
        let distance_km = crate::geometry::knots_to_km_per_min(gs) * time_to_ground_min;
        let Ok(ground_point) = project_position(lat, lon, distance_km, track) else {
            return;
        };

        if crate::geometry::calculate_distance(ground_point.0, ground_point.1, ctx.station_lat, ctx.station_lon)
            .unwrap_or(f64::MAX)
            > self.radius_km
        {
            return;
        }

        let matched = ctx
            .airports
            .find_nearby(ground_point.0, ground_point.1, FindNearbyOpts::default())
            .into_iter()
            .next()
            .map(|h| h.icao);

        aircraft.calculated.landing = Some(LandingCalc {
            is_possible_landing: matched.is_some(),
            matched_airport: matched,
            ground_point,
        });
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.landing.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.landing else {
            return AlertContent::default();
        };
        AlertContent {
            text: match &calc.matched_airport {
                Some(icao) => format!("possible landing at {icao}"),
                None => "possible landing, no matching airport".to_string(),
            },
            warn: !calc.is_possible_landing,
        }
    }
}
