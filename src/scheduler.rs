//! Periodic-poll orchestrator: fetch → preprocess → filter pass → track →
//! alert-diff → publish, one cycle per tick. One logical worker owns the
//! pipeline; the interval elides a tick rather than overlap with a cycle
//! still in progress.

use crate::airport::AirportIndex;
use crate::alerts::AlertManager;
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::filters::airprox::AirproxFilter;
use crate::filters::airport::AirportFilter;
use crate::filters::anomaly::AnomalyFilter;
use crate::filters::emergency::EmergencyFilter;
use crate::filters::landing::LandingFilter;
use crate::filters::lifting::LiftingFilter;
use crate::filters::loitering::LoiteringFilter;
use crate::filters::military::MilitaryFilter;
use crate::filters::overhead::OverheadFilter;
use crate::filters::specific::SpecificFilter;
use crate::filters::squawks::SquawksFilter;
use crate::filters::vicinity::VicinityFilter;
use crate::filters::weather::WeatherFilter;
use crate::filters::{Filter, FilterContext, FilterRegistry};
use crate::hex_flight_cache::HexFlightCache;
use crate::preprocessor;
use crate::publisher::{LoopStats, Publisher};
use crate::squawks::SquawkRegistry;
use crate::trajectory::Tracker;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn build_registry(config: &Config) -> FilterRegistry {
    let f = &config.filters;
    let mut filters: Vec<Box<dyn Filter>> = Vec::new();
    if f.emergency.enabled {
        filters.push(Box::new(EmergencyFilter));
    }
    if f.airprox.enabled {
        filters.push(Box::new(AirproxFilter::new(&f.airprox)));
    }
    if f.vicinity.enabled {
        filters.push(Box::new(VicinityFilter::new(&f.vicinity)));
    }
    if f.airport.enabled {
        filters.push(Box::new(AirportFilter));
    }
    if f.overhead.enabled {
        filters.push(Box::new(OverheadFilter::new(&f.overhead)));
    }
    if f.landing.enabled {
        filters.push(Box::new(LandingFilter::new(&f.landing)));
    }
    if f.lifting.enabled {
        filters.push(Box::new(LiftingFilter::new(&f.lifting)));
    }
    if f.anomaly.enabled {
        filters.push(Box::new(AnomalyFilter));
    }
    if f.weather.enabled {
        filters.push(Box::new(WeatherFilter));
    }
    if f.squawks.enabled {
        filters.push(Box::new(SquawksFilter));
    }
    if f.specific.enabled {
        filters.push(Box::new(SpecificFilter::new(&f.specific)));
    }
    if f.military.enabled {
        filters.push(Box::new(MilitaryFilter::new(&f.military)));
    }
    if f.loitering.enabled {
        filters.push(Box::new(LoiteringFilter::new(&f.loitering)));
    }
    FilterRegistry::new(filters)
}

fn build_airport_index(config: &Config) -> anyhow::Result<AirportIndex> {
    let rows = match &config.airports.file {
        Some(path) => crate::airport::load_airports_csv(std::path::Path::new(path))?,
        None => Vec::new(),
    };
    Ok(AirportIndex::build(rows, config.airports.apply.clone()))
}

fn build_squawk_registry(config: &Config) -> SquawkRegistry {
    match &config.squawks_file {
        Some(path) => SquawkRegistry::load_json_file(std::path::Path::new(path)).unwrap_or_else(|e| {
            warn!(error = %e, path, "failed to load squawk table, continuing without it");
            SquawkRegistry::default()
        }),
        None => SquawkRegistry::default(),
    }
}

pub struct Scheduler {
    config: Arc<Config>,
    registry: FilterRegistry,
    ctx: FilterContext,
    fetcher: Fetcher,
    tracker: Arc<Tracker>,
    hex_flight_cache: Arc<HexFlightCache>,
    alerts: AlertManager,
    publisher: Box<dyn Publisher>,
    in_progress: std::sync::atomic::AtomicBool,
}

impl Scheduler {
    pub fn new(config: Config, publisher: Box<dyn Publisher>) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let airports = Arc::new(build_airport_index(&config)?);
        let squawks = Arc::new(build_squawk_registry(&config));
        let tracker = Arc::new(Tracker::new());
        let hex_flight_cache = Arc::new(HexFlightCache::load(&config.mappings.filename));
        let registry = build_registry(&config);
        let fetcher = Fetcher::new(config.link.clone(), &config.fetcher)?;
        let ctx = FilterContext {
            station_lat: config.location.lat,
            station_lon: config.location.lon,
            config: config.clone(),
            airports,
            squawks,
            tracker: tracker.clone(),
        };
        Ok(Self {
            config,
            registry,
            ctx,
            fetcher,
            tracker,
            hex_flight_cache,
            alerts: AlertManager::new(),
            publisher,
            in_progress: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Runs one fetch/process/publish cycle. Errors are logged and counted
    /// as an empty tick rather than propagated, per the transport error kind.
    pub async fn run_cycle(&self) {
        use std::sync::atomic::Ordering;
        if self.in_progress.swap(true, Ordering::SeqCst) {
            warn!("previous cycle still in progress, eliding this tick");
            return;
        }

        let result = self.run_cycle_inner().await;
        if let Err(e) = result {
            error!(error = %e, "cycle failed");
        }

        self.in_progress.store(false, Ordering::SeqCst);
    }

    async fn run_cycle_inner(&self) -> anyhow::Result<()> {
        let snapshot = self.fetcher.fetch(&self.hex_flight_cache).await?;
        let now = Utc::now();

        let mut aircraft = preprocessor::preprocess(snapshot.aircraft, &self.config).await;

        for a in &mut aircraft {
            self.registry.preprocess_all(a, &self.ctx);
        }
        self.registry.preprocess_batch_all(&mut aircraft, &self.ctx);
        self.registry.sort_interesting(&mut aircraft);
        self.registry.postprocess_all(&self.ctx);

        self.tracker.ingest(&aircraft, now);

        let diff = self.alerts.diff(&aircraft, &self.registry, now);
        let stats = LoopStats {
            aircraft_count: aircraft.len(),
            alerts_active: self.alerts.active_count(),
            alerts_inserted: diff.inserted.len(),
            alerts_removed: diff.removed.len(),
        };
        self.publisher.publish_diff(&diff, &stats);

        Ok(())
    }

    /// Runs the periodic poll loop until cancelled. Saves the hex→flight
    /// cache every `mappings.saveInterval` seconds and flushes it on exit.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut tick = tokio::time::interval(Duration::from_secs(self.config.cycle_scan_time_secs));
        let mut save_tick = tokio::time::interval(Duration::from_secs(self.config.mappings.save_interval));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.run_cycle().await;
                }
                _ = save_tick.tick() => {
                    if let Err(e) = self.hex_flight_cache.save(Utc::now()) {
                        warn!(error = %e, "failed to save hex-flight cache");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received, flushing hex-flight cache");
                    self.hex_flight_cache.save(Utc::now())?;
                    return Ok(());
                }
            }
        }
    }

    /// Runs exactly one cycle then returns, for `--once` invocations.
    pub async fn run_once(&self) -> anyhow::Result<()> {
        self.run_cycle_inner().await?;
        self.hex_flight_cache.save(Utc::now())?;
        Ok(())
    }
}
