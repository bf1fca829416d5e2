//! Priority 5: independent weather-inference detectors over the trail.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::{Aircraft, Severity};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WeatherEntry {
    pub kind: String,
    pub severity: Severity,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherCalc {
    pub detections: Vec<WeatherEntry>,
}

impl WeatherCalc {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.detections.iter().map(|d| d.severity).max()
    }
}

pub struct WeatherFilter;

fn turbulence(ctx: &FilterContext, aircraft: &Aircraft) -> Option<WeatherEntry> {
    let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
    if data.sample_count() < 5 {
        return None;
    }
    let stats = data.get_stats(|a| a.baro_rate);
    let severity = if stats.std_dev > 1000.0 {
        Severity::High
    } else if stats.std_dev > 600.0 {
        Severity::Medium
    } else {
        return None;
    };
    Some(WeatherEntry {
        kind: "turbulence".into(),
        severity,
        details: format!("baro_rate stddev {:.0} ft/min", stats.std_dev),
    })
}

fn strong_winds(aircraft: &Aircraft) -> Option<WeatherEntry> {
    let gs = aircraft.gs?;
    let tas = aircraft.tas?;
    let alt = aircraft.calculated.altitude.unwrap_or(0.0);
    let diff = (gs - tas).abs();
    if diff <= 40.0 {
        return None;
    }
    let severity = if alt > 20_000.0 && diff > 80.0 { Severity::High } else { Severity::Medium };
    Some(WeatherEntry {
        kind: "strong-winds".into(),
        severity,
        details: format!("gs-tas diff {diff:.0} kt at {alt:.0} ft"),
    })
}

fn temperature_inversion(aircraft: &Aircraft) -> Option<WeatherEntry> {
    let oat = aircraft.oat?;
    let alt = aircraft.calculated.altitude?;
    let isa_expected = 15.0 - (alt / 1000.0) * 2.0;
    let diff = (oat - isa_expected).abs();
    if diff <= 10.0 {
        return None;
    }
    Some(WeatherEntry {
        kind: "temperature-inversion".into(),
        severity: Severity::Low,
        details: format!("oat {oat:.1}C vs ISA {isa_expected:.1}C"),
    })
}

impl Filter for WeatherFilter {
    fn id(&self) -> &'static str {
        "weather"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let mut detections = Vec::new();
        detections.extend(turbulence(ctx, aircraft));
        detections.extend(strong_winds(aircraft));
        detections.extend(temperature_inversion(aircraft));
        // Icing / severe-icing detectors are disabled by default and left
        // unimplemented; no feeder in this pack reports supercooled
        // liquid water content or ice-detector state.

        if !detections.is_empty() {
            aircraft.calculated.weather = Some(WeatherCalc { detections });
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.weather.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.weather else {
            return AlertContent::default();
        };
        let highest = calc.highest_severity().unwrap_or(Severity::Info);
        AlertContent {
            text: format!(
                "weather: {}",
                calc.detections.iter().map(|d| d.kind.as_str()).collect::<Vec<_>>().join(", ")
            ),
            warn: highest >= Severity::High,
        }
    }
}
