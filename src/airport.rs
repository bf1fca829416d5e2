//! Airport registry and the grid-cell spatial index used by the airport and
//! landing/lifting filters to answer "what's nearby" without scanning every
//! known airport on every cycle.

use crate::geometry::{calculate_distance, nm_to_km};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Grid cell edge length in degrees.
pub const GRID_CELL_DEG: f64 = 0.5;
/// Default ATZ query radius when the caller doesn't ask for a specific one.
pub const ATZ_RADIUS_MAXIMUM_KM: f64 = 1.852 * 2.5;
const CACHE_LIMIT: usize = 1000;
const CACHE_TRIM: usize = 100;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AirportType(pub Option<String>);

/// A single airport row as loaded from the fixed airport table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Airport {
    pub icao: String,
    #[serde(default)]
    pub iata: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub runway_length_max: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl Airport {
    /// ATZ radius in km: explicit override, else UK CAA defaults by runway
    /// length / IATA code presence.
    pub fn atz_radius_km(&self) -> f64 {
        if let Some(r) = self.radius {
            return r;
        }
        if self.runway_length_max.is_some_and(|l| l < 1850.0) {
            nm_to_km(2.0)
        } else if self.iata.as_ref().is_some_and(|s| !s.is_empty()) {
            nm_to_km(2.5)
        } else {
            nm_to_km(2.0)
        }
    }

    /// ATZ ceiling in feet MSL: elevation plus the height override (AGL,
    /// default 2000 ft per the UK CAA interpretation).
    pub fn atz_ceiling_ft(&self) -> f64 {
        self.elevation.unwrap_or(0.0) + self.height.unwrap_or(2000.0)
    }
}

fn cell_key(lat: f64, lon: f64) -> (i64, i64) {
    (
        (lat / GRID_CELL_DEG).floor() as i64,
        (lon / GRID_CELL_DEG).floor() as i64,
    )
}

/// Query options for [`AirportIndex::find_nearby`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FindNearbyOpts {
    pub distance_km: Option<f64>,
    pub altitude_ft: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    lat6: i64,
    lon6: i64,
    distance_bits: Option<u64>,
    altitude_bits: Option<u64>,
}

impl std::hash::Hash for CacheKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lat6.hash(state);
        self.lon6.hash(state);
        self.distance_bits.hash(state);
        self.altitude_bits.hash(state);
    }
}
impl Eq for CacheKey {}

fn cache_key(lat: f64, lon: f64, opts: FindNearbyOpts) -> CacheKey {
    CacheKey {
        lat6: (lat * 1_000_000.0).round() as i64,
        lon6: (lon * 1_000_000.0).round() as i64,
        distance_bits: opts.distance_km.map(|d| d.to_bits()),
        altitude_bits: opts.altitude_ft.map(|a| a.to_bits()),
    }
}

/// Registry of airports plus the grid-cell index over them, with an LRU
/// cache over `find_nearby` results bounded to `CACHE_LIMIT + CACHE_TRIM`
/// entries at any moment (property 2: every miss-after-overflow eviction
/// removes exactly `CACHE_TRIM` oldest entries).
pub struct AirportIndex {
    airports: HashMap<String, Airport>,
    cells: HashMap<(i64, i64), Vec<String>>,
    cache: Mutex<LruCache<CacheKey, Vec<AirportHit>>>,
}

#[derive(Debug, Clone)]
pub struct AirportHit {
    pub icao: String,
    pub distance_km: f64,
}

impl AirportIndex {
    pub fn new() -> Self {
        Self {
            airports: HashMap::new(),
            cells: HashMap::new(),
            cache: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Build from a fixed table, injecting the map key as `icao` for rows
    /// that omit it, then apply overrides (logged upserts) before indexing.
    pub fn build(rows: Vec<(String, Airport)>, overrides: Vec<Airport>) -> Self {
        let mut index = Self::new();
        for (key, mut airport) in rows {
            if airport.icao.is_empty() {
                airport.icao = key.clone();
            }
            index.insert_airport(airport);
        }
        for over in overrides {
            info!(icao = %over.icao, "applying airport override");
            index.insert_airport(over);
        }
        index
    }

    /// Insert or replace a single airport and update the grid index.
    pub fn insert_airport(&mut self, airport: Airport) {
        if !(-90.0..=90.0).contains(&airport.lat) || !(-180.0..=180.0).contains(&airport.lon) {
            warn!(icao = %airport.icao, "airport has out-of-range coordinates, skipping index entry");
            self.airports.insert(airport.icao.clone(), airport);
            return;
        }
        let key = cell_key(airport.lat, airport.lon);
        self.cells.entry(key).or_default().push(airport.icao.clone());
        self.airports.insert(airport.icao.clone(), airport);
    }

    pub fn get(&self, icao: &str) -> Option<&Airport> {
        self.airports.get(icao)
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Invalidate the find_nearby cache, e.g. after applying overrides.
    pub fn invalidate_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    /// Answer "which airports are within range of (lat, lon)", per §4.2.
    pub fn find_nearby(&self, lat: f64, lon: f64, opts: FindNearbyOpts) -> Vec<AirportHit> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Vec::new();
        }

        let key = cache_key(lat, lon, opts);
        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let radius_km = opts.distance_km.unwrap_or(ATZ_RADIUS_MAXIMUM_KM);
        let lat_half_extent =
            ((radius_km / 111.32 / GRID_CELL_DEG).ceil() as i64).max(1);
        let lon_denominator = (111.32 * deg_to_rad(lat).cos()).max(1e-6);
        let lon_half_extent = ((radius_km / lon_denominator / GRID_CELL_DEG).ceil() as i64).max(1);

        let (clat, clon) = cell_key(lat, lon);
        let mut seen = std::collections::HashSet::new();
        let mut hits = Vec::new();

        for dlat in -lat_half_extent..=lat_half_extent {
            for dlon in -lon_half_extent..=lon_half_extent {
                let Some(icaos) = self.cells.get(&(clat + dlat, clon + dlon)) else {
                    continue;
                };
                for icao in icaos {
                    if !seen.insert(icao.clone()) {
                        continue;
                    }
                    let Some(airport) = self.airports.get(icao) else {
                        continue;
                    };
                    let Ok(distance) = calculate_distance(lat, lon, airport.lat, airport.lon)
                    else {
                        continue;
                    };

                    let within_distance = match opts.distance_km {
                        Some(d) => distance <= d,
                        None => distance <= airport.atz_radius_km(),
                    };
                    let clears_altitude = match opts.altitude_ft {
                        Some(alt) => airport.atz_ceiling_ft() >= alt,
                        None => true,
                    };

                    if within_distance && clears_altitude {
                        hits.push(AirportHit {
                            icao: icao.clone(),
                            distance_km: distance,
                        });
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let mut cache = self.cache.lock().unwrap();
        cache.put(key, hits.clone());
        while cache.len() > CACHE_LIMIT {
            for _ in 0..CACHE_TRIM {
                if cache.pop_lru().is_none() {
                    break;
                }
            }
        }
        hits
    }
}

impl Default for AirportIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn deg_to_rad(d: f64) -> f64 {
    d * std::f64::consts::PI / 180.0
}

/// Load a fixed airport table from a CSV file keyed by ICAO, per the loader
/// contract: a row lacking coordinates is logged and skipped from the index
/// (but still retained in the lookup-by-icao map with zeroed coordinates
/// would violate the Airport invariant, so such rows are dropped entirely).
pub fn load_airports_csv(path: &std::path::Path) -> anyhow::Result<Vec<(String, Airport)>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<Airport>() {
        match record {
            Ok(airport) => rows.push((airport.icao.clone(), airport)),
            Err(e) => warn!(error = %e, "skipping malformed airport row"),
        }
    }
    Ok(rows)
}
