//! Priority 4: independent sub-detectors over current values + trajectory.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::{Aircraft, Severity};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyEntry {
    pub kind: String,
    pub severity: Severity,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyCalc {
    pub anomalies: Vec<AnomalyEntry>,
}

impl AnomalyCalc {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }
}

const LOOKBACK_INDEX: usize = 2;
const TEMP_DEVIATION_THRESHOLD_C: f64 = 20.0;

pub struct AnomalyFilter;

fn speed_altitude_anomaly(aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let gs = aircraft.gs?;
    let alt = aircraft.calculated.altitude?;
    if alt < 3000.0 && gs > 250.0 {
        return Some(AnomalyEntry {
            kind: "high-speed-low-alt".into(),
            severity: Severity::High,
            details: format!("{gs:.0} kt at {alt:.0} ft"),
        });
    }
    if alt > 30_000.0 && gs < 150.0 {
        return Some(AnomalyEntry {
            kind: "low-speed-high-alt".into(),
            severity: Severity::Medium,
            details: format!("{gs:.0} kt at {alt:.0} ft"),
        });
    }
    None
}

fn temperature_anomaly(aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let tat = aircraft.tat?;
    let oat = aircraft.oat?;
    let mach = aircraft.mach?;
    let observed = tat - oat;
    let expected = mach.powi(2) * 40.0;
    let deviation = (observed - expected).abs();
    if deviation > TEMP_DEVIATION_THRESHOLD_C {
        return Some(AnomalyEntry {
            kind: "temperature-anomaly".into(),
            severity: Severity::Low,
            details: format!("observed {observed:.1}C vs expected {expected:.1}C"),
        });
    }
    None
}

fn altitude_oscillation(ctx: &FilterContext, aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
    if data.sample_count() < 5 {
        return None;
    }
    let changes = data.get_direction_changes(|a| a.calculated.altitude, 300.0);
    if changes >= 3 {
        return Some(AnomalyEntry {
            kind: "altitude-oscillation".into(),
            severity: Severity::Medium,
            details: format!("{changes} direction changes over trail"),
        });
    }
    None
}

fn altitude_deviation(ctx: &FilterContext, aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let target = aircraft.nav_altitude_mcp?;
    let alt = aircraft.calculated.altitude?;
    let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
    let (values, _) = data.get_field(|a| a.calculated.altitude, 3)?;
    let prior_stable = values
        .iter()
        .take(values.len().saturating_sub(1))
        .all(|v| (v - target).abs() < 500.0);
    if prior_stable && (alt - target).abs() > 500.0 {
        return Some(AnomalyEntry {
            kind: "altitude-deviation".into(),
            severity: Severity::Medium,
            details: format!("{alt:.0} ft vs cleared {target:.0} ft"),
        });
    }
    None
}

fn extreme_vertical_rate(aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let rate = aircraft.baro_rate?.abs();
    let severity = if rate > 6000.0 {
        Severity::High
    } else if rate > 4000.0 {
        Severity::Medium
    } else {
        return None;
    };
    Some(AnomalyEntry {
        kind: "extreme-vertical-rate".into(),
        severity,
        details: format!("{rate:.0} ft/min"),
    })
}

fn rapid_vertical_rate_change(ctx: &FilterContext, aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
    let (values, _) = data.get_field(|a| a.baro_rate, LOOKBACK_INDEX + 1)?;
    let recent = *values.last()?;
    let earlier = values[values.len() - 1 - LOOKBACK_INDEX];
    let delta = (recent - earlier).abs();
    if delta <= 1500.0 {
        return None;
    }
    let tcas_active = aircraft.nav_modes.iter().any(|m| m.eq_ignore_ascii_case("tcas"));
    let severity = if tcas_active { Severity::High } else { Severity::Medium };
    Some(AnomalyEntry {
        kind: "rapid-vertical-rate-change".into(),
        severity,
        details: format!("delta {delta:.0} ft/min over {LOOKBACK_INDEX} samples, tcas={tcas_active}"),
    })
}

fn rapid_speed_change(ctx: &FilterContext, aircraft: &Aircraft) -> Option<AnomalyEntry> {
    let data = ctx.tracker.data_for(&aircraft.hex, aircraft);
    let (values, _) = data.get_field(|a| a.gs, 2)?;
    let delta = (values.last()? - values.first()?).abs();
    if delta <= 50.0 {
        return None;
    }
    let severity = if delta > 100.0 && values.len() > 3 { Severity::High } else { Severity::Medium };
    Some(AnomalyEntry {
        kind: "rapid-speed-change".into(),
        severity,
        details: format!("delta {delta:.0} kt over {} updates", values.len()),
    })
}

impl Filter for AnomalyFilter {
    fn id(&self) -> &'static str {
        "anomaly"
    }

    fn priority(&self) -> u8 {
        4
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let mut anomalies = Vec::new();
        anomalies.extend(speed_altitude_anomaly(aircraft));
        anomalies.extend(temperature_anomaly(aircraft));
        anomalies.extend(altitude_oscillation(ctx, aircraft));
        anomalies.extend(altitude_deviation(ctx, aircraft));
        anomalies.extend(extreme_vertical_rate(aircraft));
        anomalies.extend(rapid_vertical_rate_change(ctx, aircraft));
        anomalies.extend(rapid_speed_change(ctx, aircraft));

        if !anomalies.is_empty() {
            aircraft.calculated.anomaly = Some(AnomalyCalc { anomalies });
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.anomaly.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.anomaly else {
            return AlertContent::default();
        };
        let highest = calc.highest_severity().unwrap_or(Severity::Info);
        AlertContent {
            text: format!(
                "{} anomalies, highest severity {highest}: {}",
                calc.anomalies.len(),
                calc.anomalies.iter().map(|a| a.kind.as_str()).collect::<Vec<_>>().join(", ")
            ),
            warn: highest == Severity::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    #[test]
    fn high_speed_low_altitude_is_flagged() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.gs = Some(300.0);
        a.calculated.altitude = Some(1000.0);
        AnomalyFilter.preprocess(&mut a, &ctx);
        assert!(AnomalyFilter.evaluate(&a));
    }

    #[test]
    fn nominal_flight_is_not_flagged() {
        let ctx = blank_context();
        let mut a = test_aircraft("A");
        a.gs = Some(150.0);
        a.calculated.altitude = Some(5000.0);
        a.baro_rate = Some(0.0);
        AnomalyFilter.preprocess(&mut a, &ctx);
        assert!(!AnomalyFilter.evaluate(&a));
    }
}
