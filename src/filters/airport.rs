//! Priority 5: proximity to a known airport's ATZ.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::{Aircraft, AirportRef};
use crate::airport::FindNearbyOpts;
use std::cmp::Ordering;

pub struct AirportFilter;

impl Filter for AirportFilter {
    fn id(&self) -> &'static str {
        "airport"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let (Some(lat), Some(lon)) = (aircraft.lat, aircraft.lon) else {
            return;
        };
        let hits = ctx.airports.find_nearby(
            lat,
            lon,
            FindNearbyOpts { distance_km: None, altitude_ft: aircraft.calculated.altitude },
        );
        aircraft.calculated.airports_nearby = hits
            .into_iter()
            .map(|h| AirportRef { icao: h.icao, distance_km: h.distance_km })
            .collect();
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        !aircraft.calculated.airports_nearby.is_empty()
    }

    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let da = a.calculated.airports_nearby.first().map(|h| h.distance_km).unwrap_or(f64::MAX);
        let db = b.calculated.airports_nearby.first().map(|h| h.distance_km).unwrap_or(f64::MAX);
        da.total_cmp(&db)
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let names: Vec<&str> = aircraft.calculated.airports_nearby.iter().map(|a| a.icao.as_str()).collect();
        AlertContent {
            text: format!("near airport(s): {}", names.join(", ")),
            warn: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::{Airport, AirportIndex};
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    #[test]
    fn s2_airport_atz_fires() {
        let mut ctx = blank_context();
        let mut idx = AirportIndex::new();
        idx.insert_airport(Airport {
            icao: "EGLW".to_string(),
            iata: Some(String::new()),
            lat: 51.4700,
            lon: -0.0500,
            elevation: Some(18.0),
            runway_length_max: Some(1200.0),
            radius: None,
            height: None,
            name: None,
            kind: None,
        });
        ctx.airports = std::sync::Arc::new(idx);

        let mut a = test_aircraft("B");
        a.lat = Some(51.4705);
        a.lon = Some(-0.0498);
        a.calculated.altitude = Some(800.0);

        let filter = AirportFilter;
        filter.preprocess(&mut a, &ctx);
        assert!(filter.evaluate(&a));
        assert_eq!(a.calculated.airports_nearby[0].icao, "EGLW");
    }
}
