//! Priority 6: known military callsign prefixes or the four-letter-two-digit
//! shape common to NATO tactical callsigns.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::MilitaryConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TACTICAL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{4}[0-9]{2}$").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct MilitaryCalc {
    pub matched_prefix: Option<String>,
}

pub struct MilitaryFilter {
    prefixes: Vec<String>,
}

impl MilitaryFilter {
    pub fn new(conf: &MilitaryConfig) -> Self {
        Self { prefixes: conf.prefixes.iter().map(|p| p.to_ascii_uppercase()).collect() }
    }
}

impl Filter for MilitaryFilter {
    fn id(&self) -> &'static str {
        "military"
    }

    fn priority(&self) -> u8 {
        6
    }

    fn preprocess(&self, aircraft: &mut Aircraft, _ctx: &FilterContext) {
        let Some(flight) = aircraft.flight.as_deref().map(|f| f.trim().to_ascii_uppercase()) else {
            return;
        };
        let matched_prefix = self.prefixes.iter().find(|p| flight.starts_with(p.as_str())).cloned();
        if matched_prefix.is_some() || TACTICAL_SHAPE.is_match(&flight) {
            aircraft.calculated.military = Some(MilitaryCalc { matched_prefix });
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.military.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let matched = aircraft
            .calculated
            .military
            .as_ref()
            .and_then(|m| m.matched_prefix.clone())
            .unwrap_or_else(|| "tactical callsign shape".to_string());
        AlertContent {
            text: format!("military callsign, matched {matched}"),
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
    fn known_prefix_fires() {
        let filter = MilitaryFilter::new(&MilitaryConfig { enabled: true, prefixes: vec!["RRR".into()] });
        let mut a = test_aircraft("A");
        a.flight = Some("RRR12".to_string());
        filter.preprocess(&mut a, &blank_context());
        assert!(filter.evaluate(&a));
    }

    #[test]
    fn tactical_shape_fires_without_prefix_list() {
        let filter = MilitaryFilter::new(&MilitaryConfig { enabled: true, prefixes: vec![] });
        let mut a = test_aircraft("A");
        a.flight = Some("ABCD12".to_string());
        filter.preprocess(&mut a, &blank_context());
        assert!(filter.evaluate(&a));
    }

    #[test]
    fn civilian_callsign_is_quiet() {
        let filter = MilitaryFilter::new(&MilitaryConfig { enabled: true, prefixes: vec!["RRR".into()] });
        let mut a = test_aircraft("A");
        a.flight = Some("BAW123".to_string());
        filter.preprocess(&mut a, &blank_context());
        assert!(!filter.evaluate(&a));
    }
}
