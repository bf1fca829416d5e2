//! Priority ~6: lookup the aircraft's squawk in the ranged squawk registry.

use super::{AlertContent, Filter, FilterContext};
use crate::aircraft::Aircraft;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SquawkCalc {
    pub kind: String,
    pub description: String,
    pub details: Vec<String>,
}

pub struct SquawksFilter;

impl Filter for SquawksFilter {
    fn id(&self) -> &'static str {
        "squawks"
    }

    fn priority(&self) -> u8 {
        6
    }

    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        let Some(squawk) = &aircraft.squawk else { return };
        if let Some(range) = ctx.squawks.lookup(squawk) {
            aircraft.calculated.squawks = Some(SquawkCalc {
                kind: range.kind.clone(),
                description: range.description.clone(),
                details: range.details.clone(),
            });
        }
    }

    fn evaluate(&self, aircraft: &Aircraft) -> bool {
        aircraft.calculated.squawks.is_some()
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent {
        let Some(calc) = &aircraft.calculated.squawks else {
            return AlertContent::default();
        };
        AlertContent {
            text: format!("squawk {}: {}", calc.kind, calc.description),
            warn: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_aircraft;
    use crate::squawks::{SquawkRange, SquawkRegistry, SquawkTable};
    use std::sync::Arc;

    #[test]
    fn matching_squawk_fires() {
        let mut ctx = crate::filters::tests_support::blank_context();
        ctx.squawks = Arc::new(SquawkRegistry::from_table(SquawkTable {
            codes: vec![SquawkRange {
                begin: "7401".to_string(),
                end: None,
                kind: "nato".to_string(),
                description: "NATO common".to_string(),
                details: vec![],
            }],
        }));

        let mut a = test_aircraft("A");
        a.squawk = Some("7401".to_string());
        SquawksFilter.preprocess(&mut a, &ctx);
        assert!(SquawksFilter.evaluate(&a));
    }
}
