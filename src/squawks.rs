//! Squawk code registry: maps the 4-digit octal transponder code space to
//! range-based metadata (military black boxes, NATO handling, etc.), loaded
//! from a bundled JSON table.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct SquawkRange {
    pub begin: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquawkTable {
    pub codes: Vec<SquawkRange>,
}

fn octal_to_u16(code: &str) -> Option<u16> {
    u16::from_str_radix(code, 8).ok()
}

/// The codes table exploded into a direct 4-digit-octal lookup, built once at
/// load time so the squawks filter is O(1) per aircraft.
#[derive(Debug, Clone, Default)]
pub struct SquawkRegistry {
    by_code: HashMap<u16, usize>,
    ranges: Vec<SquawkRange>,
}

impl SquawkRegistry {
    pub fn from_table(table: SquawkTable) -> Self {
        let mut registry = SquawkRegistry {
            by_code: HashMap::new(),
            ranges: Vec::new(),
        };
        for range in table.codes {
            let Some(begin) = octal_to_u16(&range.begin) else {
                continue;
            };
            let end = range
                .end
                .as_deref()
                .and_then(octal_to_u16)
                .unwrap_or(begin);
            let idx = registry.ranges.len();
            for code in begin..=end {
                registry.by_code.insert(code, idx);
            }
            registry.ranges.push(range);
        }
        registry
    }

    pub fn lookup(&self, squawk: &str) -> Option<&SquawkRange> {
        let code = octal_to_u16(squawk)?;
        let idx = *self.by_code.get(&code)?;
        self.ranges.get(idx)
    }

    pub fn load_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table: SquawkTable = serde_json::from_str(&text)?;
        Ok(Self::from_table(table))
    }
}
