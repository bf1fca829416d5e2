//! The aircraft snapshot wire format and the enriched `calculated` record
//! filters populate as the pipeline runs.

use crate::category::{Category, EmergencyStatus};
use crate::filters::{
    airprox::AirproxCalc, anomaly::AnomalyCalc, emergency::EmergencyCalc, landing::LandingCalc,
    lifting::LiftingCalc, loitering::LoiteringCalc, military::MilitaryCalc,
    overhead::OverheadCalc, specific::SpecificCalc, squawks::SquawkCalc, vicinity::VicinityCalc,
    weather::WeatherCalc,
};
use crate::geometry::RelativePosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Altitude as reported by the feeder: either a numeric value in feet or the
/// literal string `"ground"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AltitudeValue {
    Feet(f64),
    Ground,
}

impl<'de> Deserialize<'de> for AltitudeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(AltitudeValue::Feet(n)),
            Raw::Str(s) if s.eq_ignore_ascii_case("ground") => Ok(AltitudeValue::Ground),
            Raw::Str(s) => s
                .parse::<f64>()
                .map(AltitudeValue::Feet)
                .map_err(serde::de::Error::custom),
        }
    }
}

impl AltitudeValue {
    pub fn as_feet(self) -> f64 {
        match self {
            AltitudeValue::Feet(f) => f,
            AltitudeValue::Ground => 0.0,
        }
    }
}

/// Ordered alert severity ladder, `info < low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// A single aircraft as received on the wire, before enrichment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Aircraft {
    pub hex: String,
    pub flight: Option<String>,
    pub squawk: Option<String>,
    pub category: Option<Category>,
    #[serde(default)]
    pub emergency: Option<EmergencyStatus>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Last known good position, carried over by the feeder when a cycle's
    /// report omits `lat`/`lon`. The preprocessor substitutes from this.
    #[serde(default)]
    pub last_position: Option<(f64, f64)>,
    pub track: Option<f64>,
    pub gs: Option<f64>,
    pub baro_rate: Option<f64>,
    pub tas: Option<f64>,
    pub mach: Option<f64>,
    pub oat: Option<f64>,
    pub tat: Option<f64>,
    pub alt_baro: Option<AltitudeValue>,
    pub alt_geom: Option<AltitudeValue>,
    pub nav_altitude_mcp: Option<f64>,
    #[serde(default)]
    pub nav_modes: Vec<String>,

    #[serde(skip, default)]
    pub calculated: Calculated,
}

impl Aircraft {
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    pub fn altitude_ft(&self) -> Option<f64> {
        self.calculated.altitude
    }
}

/// A reference to a nearby airport, as attached by the airport filter.
#[derive(Debug, Clone, Serialize)]
pub struct AirportRef {
    pub icao: String,
    pub distance_km: f64,
}

/// Everything the pipeline derives about an aircraft during one cycle.
/// Each filter writes only into its own field, per the plugin contract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Calculated {
    pub altitude: Option<f64>,
    pub distance: Option<f64>,
    pub position_relative: Option<RelativePosition>,
    pub position_substituted: bool,
    pub timestamp_updated: Option<DateTime<Utc>>,

    pub emergency: Option<EmergencyCalc>,
    pub airprox: Option<AirproxCalc>,
    pub vicinity: Option<VicinityCalc>,
    pub airports_nearby: Vec<AirportRef>,
    pub overhead: Option<OverheadCalc>,
    pub landing: Option<LandingCalc>,
    pub lifting: Option<LiftingCalc>,
    pub anomaly: Option<AnomalyCalc>,
    pub weather: Option<WeatherCalc>,
    pub squawks: Option<SquawkCalc>,
    pub specific: Option<SpecificCalc>,
    pub military: Option<MilitaryCalc>,
    pub loitering: Option<LoiteringCalc>,
}

/// Top-level shape of a polled snapshot.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AircraftSnapshot {
    #[serde(default)]
    pub aircraft: Vec<Aircraft>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub aircraft_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_ground_literal_parses() {
        let v: AltitudeValue = serde_json::from_str("\"ground\"").unwrap();
        assert_eq!(v, AltitudeValue::Ground);
        assert_eq!(v.as_feet(), 0.0);
    }

    #[test]
    fn altitude_numeric_parses() {
        let v: AltitudeValue = serde_json::from_str("1500").unwrap();
        assert_eq!(v, AltitudeValue::Feet(1500.0));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn aircraft_deserializes_minimal() {
        let json = r#"{"hex":"A12345","lat":51.5,"lon":-0.14}"#;
        let a: Aircraft = serde_json::from_str(json).unwrap();
        assert_eq!(a.hex, "A12345");
        assert!(a.has_position());
    }
}
