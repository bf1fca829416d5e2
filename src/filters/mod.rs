//! The pluggable filter framework: a priority-ordered list of detectors that
//! each get a preprocess/evaluate/sort/format lifecycle per cycle.

pub mod airprox;
pub mod airport;
pub mod anomaly;
pub mod emergency;
pub mod landing;
pub mod lifting;
pub mod loitering;
pub mod military;
pub mod overhead;
pub mod specific;
pub mod squawks;
pub mod vicinity;
pub mod weather;

use crate::aircraft::{Aircraft, Severity};
use crate::airport::AirportIndex;
use crate::config::Config;
use crate::squawks::SquawkRegistry;
use crate::trajectory::Tracker;
use std::cmp::Ordering;
use std::sync::Arc;

/// Read-only state shared across every filter during `configure`,
/// `preprocess` and `evaluate`: station location, airport registry,
/// trajectory tracker, squawk registry and the full configuration.
pub struct FilterContext {
    pub station_lat: f64,
    pub station_lon: f64,
    pub config: Arc<Config>,
    pub airports: Arc<AirportIndex>,
    pub squawks: Arc<SquawkRegistry>,
    pub tracker: Arc<Tracker>,
}

/// Content a filter wants folded into an alert when it fires.
#[derive(Debug, Clone, Default)]
pub struct AlertContent {
    pub text: String,
    pub warn: bool,
}

/// The capability set every detector implements. `configure` happens once at
/// startup; `preprocess`/`evaluate` run every cycle for every aircraft.
pub trait Filter: Send + Sync {
    fn id(&self) -> &'static str;
    fn priority(&self) -> u8;

    /// Write derived data into `aircraft.calculated.<id>`. Must be
    /// idempotent: running it twice on the same input is a no-op the second
    /// time (property 6, preprocessor purity).
    fn preprocess(&self, aircraft: &mut Aircraft, ctx: &FilterContext);

    /// Does this filter fire for this aircraft?
    fn evaluate(&self, aircraft: &Aircraft) -> bool;

    /// Tie-break ordering between two aircraft that both fired this filter.
    fn compare(&self, a: &Aircraft, b: &Aircraft) -> Ordering {
        let _ = (a, b);
        Ordering::Equal
    }

    fn format(&self, aircraft: &Aircraft) -> AlertContent;

    /// Optional once-per-cycle cleanup, e.g. per-hex history GC.
    fn postprocess(&self, _ctx: &FilterContext) {}

    /// Optional whole-snapshot pass for filters that need to compare
    /// aircraft against each other (airprox). Runs once per cycle after
    /// every aircraft's per-aircraft `preprocess` has completed.
    fn preprocess_batch(&self, _aircraft: &mut [Aircraft], _ctx: &FilterContext) {}
}

/// Ordered list of registered filters, sorted by ascending priority
/// (1 = highest) once at construction.
pub struct FilterRegistry {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new(mut filters: Vec<Box<dyn Filter>>) -> Self {
        filters.sort_by_key(|f| f.priority());
        Self { filters }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    pub fn preprocess_all(&self, aircraft: &mut Aircraft, ctx: &FilterContext) {
        for filter in &self.filters {
            filter.preprocess(aircraft, ctx);
        }
    }

    /// The highest-priority filter (lowest `priority()`) that fires for this
    /// aircraft, if any.
    pub fn firing_filter(&self, aircraft: &Aircraft) -> Option<&dyn Filter> {
        self.filters
            .iter()
            .find(|f| f.evaluate(aircraft))
            .map(|f| f.as_ref())
    }

    pub fn preprocess_batch_all(&self, aircraft: &mut [Aircraft], ctx: &FilterContext) {
        for filter in &self.filters {
            filter.preprocess_batch(aircraft, ctx);
        }
    }

    pub fn postprocess_all(&self, ctx: &FilterContext) {
        for filter in &self.filters {
            filter.postprocess(ctx);
        }
    }

    /// Sort aircraft that fired at least one filter: by the priority of the
    /// highest-priority firing filter, tie-broken by that filter's own
    /// `compare`, falling back to ascending distance (undefined distance
    /// sorts last) when neither fires for a given pair.
    pub fn sort_interesting(&self, aircraft: &mut [Aircraft]) {
        aircraft.sort_by(|a, b| {
            let fa = self.firing_filter(a);
            let fb = self.firing_filter(b);
            match (fa, fb) {
                (Some(fa), Some(fb)) if fa.priority() == fb.priority() => fa.compare(a, b),
                (Some(fa), Some(fb)) => fa.priority().cmp(&fb.priority()),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => match (a.calculated.distance, b.calculated.distance) {
                    (Some(da), Some(db)) => da.total_cmp(&db),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                },
            }
        });
    }
}

pub fn severity_ladder(severities: &[Severity]) -> Option<Severity> {
    severities.iter().copied().max()
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::FilterContext;
    use crate::airport::AirportIndex;
    use crate::config::{
        AirportsConfig, Config, FetcherConfig, FiltersConfig, FlightsConfig, Location,
        MappingsConfig, MqttConfig,
    };
    use crate::squawks::SquawkRegistry;
    use crate::trajectory::Tracker;
    use std::sync::Arc;

    pub fn blank_context() -> FilterContext {
        let config = Config {
            link: "http://example.invalid".into(),
            location: Location { lat: 51.5, lon: -0.14, alt: 0.0 },
            range_max: 50.0,
            filters: FiltersConfig::default(),
            flights: FlightsConfig::default(),
            airports: AirportsConfig::default(),
            mqtt: MqttConfig::default(),
            mappings: MappingsConfig::default(),
            fetcher: FetcherConfig::default(),
            squawks_file: None,
            cycle_scan_time_secs: 30,
        };
        FilterContext {
            station_lat: config.location.lat,
            station_lon: config.location.lon,
            config: Arc::new(config),
            airports: Arc::new(AirportIndex::new()),
            squawks: Arc::new(SquawkRegistry::default()),
            tracker: Arc::new(Tracker::new()),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_aircraft(hex: &str) -> Aircraft {
    Aircraft {
        hex: hex.to_string(),
        flight: None,
        squawk: None,
        category: None,
        emergency: None,
        lat: None,
        lon: None,
        last_position: None,
        track: None,
        gs: None,
        baro_rate: None,
        tas: None,
        mach: None,
        oat: None,
        tat: None,
        alt_baro: None,
        alt_geom: None,
        nav_altitude_mcp: None,
        nav_modes: Vec::new(),
        calculated: Default::default(),
    }
}
