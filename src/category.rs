//! ADS-B emitter category and emergency status enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ADS-B wake-vortex / emitter category, the two-character codes `A0..D7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    B0,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    C0,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
}

impl Category {
    /// True for category B6/B7, the rotorcraft and UAV-adjacent codes that
    /// the landing/lifting filters treat with a lower minimum vertical rate.
    pub fn is_rotorcraft(self) -> bool {
        matches!(self, Category::B6)
    }

    /// True for the "heavy" wake-turbulence band (A5).
    pub fn is_heavy(self) -> bool {
        matches!(self, Category::A5)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Category::*;
        Ok(match s.to_ascii_uppercase().as_str() {
            "A0" => A0,
            "A1" => A1,
            "A2" => A2,
            "A3" => A3,
            "A4" => A4,
            "A5" => A5,
            "A6" => A6,
            "A7" => A7,
            "B0" => B0,
            "B1" => B1,
            "B2" => B2,
            "B3" => B3,
            "B4" => B4,
            "B5" => B5,
            "B6" => B6,
            "B7" => B7,
            "C0" => C0,
            "C1" => C1,
            "C2" => C2,
            "C3" => C3,
            "C4" => C4,
            "C5" => C5,
            "C6" => C6,
            "C7" => C7,
            "D0" => D0,
            "D1" => D1,
            "D2" => D2,
            "D3" => D3,
            "D4" => D4,
            "D5" => D5,
            "D6" => D6,
            "D7" => D7,
            other => return Err(format!("unknown emitter category {other}")),
        })
    }
}

/// ADS-B declared emergency status, straight from the `emergency` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyStatus {
    #[default]
    None,
    General,
    Lifeguard,
    Minfuel,
    Nordo,
    Unlawful,
    Downed,
    Reserved,
}

impl FromStr for EmergencyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use EmergencyStatus::*;
        Ok(match s.to_ascii_lowercase().as_str() {
            "none" | "" => None,
            "general" => General,
            "lifeguard" => Lifeguard,
            "minfuel" => Minfuel,
            "nordo" => Nordo,
            "unlawful" => Unlawful,
            "downed" => Downed,
            "reserved" => Reserved,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_string() {
        assert_eq!("B6".parse::<Category>().unwrap(), Category::B6);
        assert!(Category::B6.is_rotorcraft());
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("Z9".parse::<Category>().is_err());
    }

    #[test]
    fn emergency_status_defaults_to_none() {
        assert_eq!(EmergencyStatus::default(), EmergencyStatus::None);
        assert_eq!("none".parse::<EmergencyStatus>().unwrap(), EmergencyStatus::None);
    }
}
