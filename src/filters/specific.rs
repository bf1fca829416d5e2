//! Priority 3: configured regex rules over flight/category fields.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use crate::config::{SpecificConfig, SpecificField};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::error;

#[derive(Debug, Clone, Serialize)]
pub struct SpecificCalc {
    pub category: String,
    pub description: String,
}

struct CompiledRule {
    field: SpecificField,
    pattern: Regex,
    category: String,
    description: String,
    /// Lower sorts first; order of appearance in config is the priority.
    priority: usize,
}

pub struct SpecificFilter {
    rules: Vec<CompiledRule>,
}

impl SpecificFilter {
    /// Compiles every pattern once at configure time. A malformed pattern is
    /// a fatal configuration error per the framework's regex-compilation
    /// design note, so it is dropped here with a logged error rather than
    /// silently matched against every aircraft.
    pub fn new(conf: &SpecificConfig) -> Self {
        let mut rules = Vec::new();
        for (priority, rule) in conf.flights.iter().enumerate() {
            match Regex::new(&rule.pattern) {
                Ok(pattern) => rules.push(CompiledRule {
                    field: rule.field,
                    pattern,
                    category: rule.category.clone(),
                    description: rule.description.clone().unwrap_or_default(),
                    priority,
                }),
                Err(e) => error!(pattern = %rule.pattern, error = %e, "specific filter pattern failed to compile, dropping rule"),
            }
        }
        Self { rules }
    }
}

impl Filter for SpecificFilter {
    fn id(&self) -> &'static str {
        "specific"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn preprocess(&self, aircraft: &mut Aircraft, _ctx: &FilterContext) {
        for rule in &self.rules {
            let subject = match rule.field {
                SpecificField::Flight => aircraft.flight.clone(),
                SpecificField::Category => aircraft.category.map(|c| c.to_string()),
            };
            let Some(subject) = subject else { continue };
            if rule.pattern.is_match(&subject) {
                aircraft.calculated.specific = Some(SpecificCalc {
                    category: rule.category.clone(),
                    description: rule.description.clone(),
                });
                return;
            }
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.specific.is_some()
    }

    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let pa = a
            .calculated
            .specific
            .as_ref()
            .and_then(|c| self.rules.iter().find(|r| r.category == c.category))
            .map(|r| r.priority)
            .unwrap_or(usize::MAX);
        let pb = b
            .calculated
            .specific
            .as_ref()
            .and_then(|c| self.rules.iter().find(|r| r.category == c.category))
            .map(|r| r.priority)
            .unwrap_or(usize::MAX);
        pa.cmp(&pb)
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.specific else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!("specific flight category {}: {}", calc.category, calc.description),
            warn: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpecificFlightRule;
    use crate::filters::test_aircraft;
    use crate::filters::tests_support::blank_context;

    #[test]
    fn matching_callsign_pattern_fires() {
        let conf = SpecificConfig {
            enabled: true,
            flights: vec![SpecificFlightRule {
                field: SpecificField::Flight,
                pattern: "^RRR".to_string(),
                category: "government".to_string(),
                description: Some("Royal flight".to_string()),
            }],
        };
        let filter = SpecificFilter::new(&conf);
        let mut a = test_aircraft("A");
        a.flight = Some("RRR1".to_string());
        filter.preprocess(&mut a, &blank_context());
        assert!(filter.evaluate(&a));
    }

    #[test]
    fn invalid_pattern_is_dropped_not_fatal() {
        let conf = SpecificConfig {
            enabled: true,
            flights: vec![SpecificFlightRule {
                field: SpecificField::Flight,
                pattern: "[".to_string(),
                category: "test".to_string(),
                description: None,
            }],
        };
        let filter = SpecificFilter::new(&conf);
        assert!(filter.rules.is_empty());
    }
}
