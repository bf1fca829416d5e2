//! Attaches the `calculated` block before the filter pass: position
//! substitution, altitude normalization, distance and position-relative to
//! the station. Runs once per aircraft per cycle and yields cooperatively
//! every 50 aircraft so the HTTP loop keeps making progress.

use crate::aircraft::Aircraft;
use crate::config::{Config, FlightsConfig};
use crate::geometry::{calculate_bearing, calculate_distance, calculate_relative_position};
use chrono::Utc;
use tracing::debug;

const YIELD_EVERY: usize = 50;

fn normalize_altitude(aircraft: &Aircraft) -> Option<f64> {
    aircraft
        .alt_baro
        .or(aircraft.alt_geom)
        .map(|v| v.as_feet())
}

fn substitute_position(aircraft: &mut Aircraft) {
    if aircraft.lat.is_none() || aircraft.lon.is_none() {
        if let Some((lat, lon)) = aircraft.last_position {
            aircraft.lat = Some(lat);
            aircraft.lon = Some(lon);
            aircraft.calculated.position_substituted = true;
        }
    }
}

fn is_excluded(flight: &Option<String>, exclude: &[String]) -> bool {
    let Some(flight) = flight else { return false };
    exclude.iter().any(|pattern| pattern.eq_ignore_ascii_case(flight.trim()))
}

/// Drops excluded callsigns, then attaches `calculated` to every remaining
/// aircraft: position substitution, altitude, distance, and (if `track` is
/// present) full relative-position geometry.
pub async fn preprocess(aircraft: Vec<Aircraft>, config: &Config) -> Vec<Aircraft> {
    preprocess_at(aircraft, config, Utc::now()).await
}

pub(crate) async fn preprocess_at(
    aircraft: Vec<Aircraft>,
    config: &Config,
    now: chrono::DateTime<Utc>,
) -> Vec<Aircraft> {
    let station_lat = config.location.lat;
    let station_lon = config.location.lon;
    let exclude = &config.flights.exclude;

    let mut out = Vec::with_capacity(aircraft.len());
    for (i, mut a) in aircraft.into_iter().enumerate() {
        if is_excluded(&a.flight, exclude) {
            continue;
        }

        substitute_position(&mut a);
        a.calculated.altitude = normalize_altitude(&a);

        if let (Some(lat), Some(lon)) = (a.lat, a.lon) {
            if let Ok(distance) = calculate_distance(station_lat, station_lon, lat, lon) {
                a.calculated.distance = Some(distance);
                if let Some(track) = a.track {
                    if let Ok(rel) = calculate_relative_position(
                        station_lat,
                        station_lon,
                        lat,
                        lon,
                        track,
                    ) {
                        a.calculated.position_relative = Some(rel);
                    } else if let Ok(bearing) = calculate_bearing(station_lat, station_lon, lat, lon) {
                        debug!(hex = %a.hex, bearing, "relative position unavailable despite bearing");
                    }
                }
            }
        }

        a.calculated.timestamp_updated = Some(now);
        out.push(a);

        if (i + 1) % YIELD_EVERY == 0 {
            tokio::task::yield_now().await;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::AltitudeValue;
    use crate::config::{
        AirportsConfig, FetcherConfig, FiltersConfig, Location, MappingsConfig, MqttConfig,
    };
    use crate::filters::test_aircraft;

    fn test_config() -> Config {
        Config {
            link: "http://example.invalid".into(),
            location: Location { lat: 51.5, lon: -0.14, alt: 0.0 },
            range_max: 50.0,
            filters: FiltersConfig::default(),
            flights: FlightsConfig { exclude: vec!["GHOST".into()] },
            airports: AirportsConfig::default(),
            mqtt: MqttConfig::default(),
            mappings: MappingsConfig::default(),
            fetcher: FetcherConfig::default(),
            squawks_file: None,
            cycle_scan_time_secs: 30,
        }
    }

    #[tokio::test]
    async fn excluded_callsign_is_dropped() {
        let config = test_config();
        let mut a = test_aircraft("A");
        a.flight = Some("GHOST".into());
        let out = preprocess(vec![a], &config).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn ground_altitude_normalizes_to_zero() {
        let config = test_config();
        let mut a = test_aircraft("A");
        a.alt_baro = Some(AltitudeValue::Ground);
        let out = preprocess(vec![a], &config).await;
        assert_eq!(out[0].calculated.altitude, Some(0.0));
    }

    #[tokio::test]
    async fn missing_position_substituted_from_last_position() {
        let config = test_config();
        let mut a = test_aircraft("A");
        a.last_position = Some((51.6, -0.1));
        let out = preprocess(vec![a], &config).await;
        assert_eq!(out[0].lat, Some(51.6));
        assert!(out[0].calculated.position_substituted);
    }

    #[tokio::test]
    async fn distance_computed_when_position_present() {
        let config = test_config();
        let mut a = test_aircraft("A");
        a.lat = Some(51.6);
        a.lon = Some(-0.1);
        let out = preprocess(vec![a], &config).await;
        assert!(out[0].calculated.distance.unwrap() > 0.0);
    }
}
