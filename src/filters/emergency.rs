//! Priority 1: declared ADS-B emergencies and emergency squawk codes.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::{Aircraft, Severity};
use crate::category::EmergencyStatus;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyKind {
    Hijack,
    RadioFailure,
    GeneralEmergency,
    MedicalEmergency,
    MinimumFuel,
    DownedAircraft,
    ReservedEmergency,
    EmergencySquawk,
}

impl EmergencyKind {
    fn priority(self) -> u8 {
        match self {
            EmergencyKind::Hijack => 0,
            EmergencyKind::DownedAircraft => 1,
            EmergencyKind::GeneralEmergency => 2,
            EmergencyKind::MedicalEmergency => 3,
            EmergencyKind::MinimumFuel => 4,
            EmergencyKind::RadioFailure => 5,
            EmergencyKind::EmergencySquawk => 6,
            EmergencyKind::ReservedEmergency => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencySource {
    AdsbStatus,
    Squawk,
    Both,
    Mismatch,
}

impl EmergencySource {
    /// Lower is more reliable; used as a sort tie-break.
    fn reliability_rank(self) -> u8 {
        match self {
            EmergencySource::Both => 0,
            EmergencySource::AdsbStatus => 1,
            EmergencySource::Squawk => 2,
            EmergencySource::Mismatch => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergencyCalc {
    pub kind: EmergencyKind,
    pub severity: Severity,
    pub source: EmergencySource,
}

fn classify_status(status: EmergencyStatus) -> Option<EmergencyKind> {
    match status {
        EmergencyStatus::None => None,
        EmergencyStatus::Unlawful => Some(EmergencyKind::Hijack),
        EmergencyStatus::Downed => Some(EmergencyKind::DownedAircraft),
        EmergencyStatus::General => Some(EmergencyKind::GeneralEmergency),
        EmergencyStatus::Lifeguard => Some(EmergencyKind::MedicalEmergency),
        EmergencyStatus::Minfuel => Some(EmergencyKind::MinimumFuel),
        EmergencyStatus::Nordo => Some(EmergencyKind::RadioFailure),
        EmergencyStatus::Reserved => Some(EmergencyKind::ReservedEmergency),
    }
}

fn classify_squawk(squawk: &str) -> Option<EmergencyKind> {
    match squawk {
        "7500" => Some(EmergencyKind::Hijack),
        "7600" => Some(EmergencyKind::RadioFailure),
        "7700" => Some(EmergencyKind::GeneralEmergency),
        _ => None,
    }
}

fn severity_for(kind: EmergencyKind, source: EmergencySource) -> Severity {
    match source {
        EmergencySource::Mismatch => Severity::Medium,
        _ => match kind {
            EmergencyKind::Hijack
            | EmergencyKind::GeneralEmergency
            | EmergencyKind::DownedAircraft => Severity::Critical,
            EmergencyKind::MedicalEmergency | EmergencyKind::MinimumFuel => Severity::High,
            EmergencyKind::RadioFailure => Severity::Medium,
            EmergencyKind::EmergencySquawk | EmergencyKind::ReservedEmergency => Severity::Medium,
        },
    }
}

pub struct EmergencyFilter;

impl Filter for EmergencyFilter {
    fn id(&self) -> &'static str {
        "emergency"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn preprocess(&self, aircraft: &mut Aircraft, _ctx: &FilterContext) {
        let status_kind = aircraft.emergency.and_then(classify_status);
        let squawk_kind = aircraft.squawk.as_deref().and_then(classify_squawk);

        let result = match (status_kind, squawk_kind) {
            (Some(sk), Some(qk)) if sk == qk => Some((sk, EmergencySource::Both)),
            (Some(sk), Some(_)) => Some((sk, EmergencySource::AdsbStatus)),
            (Some(sk), None) => Some((sk, EmergencySource::AdsbStatus)),
            (None, Some(qk)) => {
                // ADS-B declares no emergency but squawk says otherwise:
                // mismatch per §4.7, still reported with source=squawk per
                // property 7.
                let declares_none = matches!(aircraft.emergency, Some(EmergencyStatus::None) | None);
                let source = if declares_none {
                    EmergencySource::Squawk
                } else {
                    EmergencySource::Mismatch
                };
                Some((qk, source))
            }
            (None, None) => None,
        };

        aircraft.calculated.emergency = result.map(|(kind, source)| EmergencyCalc {
            kind,
            severity: severity_for(kind, source),
            source,
        });
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.emergency.is_some()
    }

    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let (Some(ea), Some(eb)) = (&a.calculated.emergency, &b.calculated.emergency) else {
            return Ordering::Equal;
        };
        eb.severity
            .cmp(&ea.severity)
            .then_with(|| ea.source.reliability_rank().cmp(&eb.source.reliability_rank()))
            .then_with(|| ea.kind.priority().cmp(&eb.kind.priority()))
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.emergency else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!("emergency: {:?} ({:?} severity, source {:?})", calc.kind, calc.severity, calc.source),
            warn: true,
        }
    }
}
