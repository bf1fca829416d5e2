//! Configuration surface, loaded from TOML and overlaid with `.env` values,
//! mirroring the external configuration surface one-to-one.

use crate::airport::Airport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    /// Station altitude, meters.
    #[serde(default)]
    pub alt: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VicinityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "VicinityConfig::default_distance")]
    pub distance: f64,
    #[serde(default = "VicinityConfig::default_altitude")]
    pub altitude: f64,
}
impl VicinityConfig {
    fn default_distance() -> f64 {
        10.0
    }
    fn default_altitude() -> f64 {
        10_000.0
    }
}
impl Default for VicinityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: Self::default_distance(),
            altitude: Self::default_altitude(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverheadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "OverheadConfig::default_radius")]
    pub radius: f64,
    #[serde(default = "OverheadConfig::default_time")]
    pub time: f64,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
}
impl OverheadConfig {
    fn default_radius() -> f64 {
        2.0
    }
    fn default_time() -> f64 {
        120.0
    }
}
impl Default for OverheadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: Self::default_radius(),
            time: Self::default_time(),
            distance: None,
            altitude: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LandingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "LandingConfig::default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
}
impl LandingConfig {
    fn default_radius() -> f64 {
        5.0
    }
}
impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: Self::default_radius(),
            distance: None,
            altitude: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LiftingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "LiftingConfig::default_altitude")]
    pub altitude: f64,
    #[serde(default = "LiftingConfig::default_radius")]
    pub radius: f64,
    #[serde(default = "LiftingConfig::default_min_climb_rate")]
    pub min_climb_rate: f64,
}
impl LiftingConfig {
    fn default_altitude() -> f64 {
        10_000.0
    }
    fn default_radius() -> f64 {
        5.0
    }
    fn default_min_climb_rate() -> f64 {
        200.0
    }
}
impl Default for LiftingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            altitude: Self::default_altitude(),
            radius: Self::default_radius(),
            min_climb_rate: Self::default_min_climb_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirproxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "AirproxConfig::default_horizontal")]
    pub horizontal_threshold: f64,
    #[serde(default = "AirproxConfig::default_vertical")]
    pub vertical_threshold: f64,
}
impl AirproxConfig {
    fn default_horizontal() -> f64 {
        1.0
    }
    fn default_vertical() -> f64 {
        1000.0
    }
}
impl Default for AirproxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            horizontal_threshold: Self::default_horizontal(),
            vertical_threshold: Self::default_vertical(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirportFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub priorities: Vec<String>,
}
impl Default for AirportFilterConfig {
    fn default() -> Self {
        Self { enabled: true, priorities: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecificFlightRule {
    pub field: SpecificField,
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpecificField {
    Flight,
    Category,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecificConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub flights: Vec<SpecificFlightRule>,
}
impl Default for SpecificConfig {
    fn default() -> Self {
        Self { enabled: true, flights: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MilitaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub prefixes: Vec<String>,
}
impl Default for MilitaryConfig {
    fn default() -> Self {
        Self { enabled: true, prefixes: default_military_prefixes() }
    }
}
fn default_military_prefixes() -> Vec<String> {
    ["RRR", "ASCOT", "NATO", "FORCE", "REACH"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoiteringConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "LoiteringConfig::default_window")]
    pub window: usize,
    #[serde(default = "LoiteringConfig::default_variance_max")]
    pub track_variance_max: f64,
    #[serde(default = "LoiteringConfig::default_radius_max")]
    pub radius_max: f64,
}
impl LoiteringConfig {
    fn default_window() -> usize {
        8
    }
    fn default_variance_max() -> f64 {
        40.0
    }
    fn default_radius_max() -> f64 {
        5.0
    }
}
impl Default for LoiteringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Self::default_window(),
            track_variance_max: Self::default_variance_max(),
            radius_max: Self::default_radius_max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimpleFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}
impl Default for SimpleFilterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FiltersConfig {
    #[serde(default)]
    pub emergency: SimpleFilterConfig,
    #[serde(default)]
    pub airprox: AirproxConfig,
    #[serde(default)]
    pub vicinity: VicinityConfig,
    #[serde(default)]
    pub airport: AirportFilterConfig,
    #[serde(default)]
    pub overhead: OverheadConfig,
    #[serde(default)]
    pub landing: LandingConfig,
    #[serde(default)]
    pub lifting: LiftingConfig,
    #[serde(default)]
    pub anomaly: SimpleFilterConfig,
    #[serde(default)]
    pub weather: SimpleFilterConfig,
    #[serde(default)]
    pub squawks: SimpleFilterConfig,
    #[serde(default)]
    pub specific: SpecificConfig,
    #[serde(default)]
    pub military: MilitaryConfig,
    #[serde(default)]
    pub loitering: LoiteringConfig,
}

fn default_mqtt_client_id() -> String {
    "atzwatch".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PublishTopics {
    #[serde(default = "default_alert_topic")]
    pub alert: String,
    #[serde(default = "default_state_topic")]
    pub state: String,
}
fn default_alert_topic() -> String {
    "atzwatch/alert".to_string()
}
fn default_state_topic() -> String {
    "atzwatch/state".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub publish_topics: PublishTopics,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingsConfig {
    #[serde(default = "MappingsConfig::default_filename")]
    pub filename: String,
    #[serde(default = "MappingsConfig::default_save_interval")]
    pub save_interval: u64,
    #[serde(default = "MappingsConfig::default_expiry_time")]
    pub expiry_time: u64,
    #[serde(default)]
    pub fetch_online: bool,
    #[serde(default)]
    pub fetch_mode: Option<String>,
    #[serde(default)]
    pub fetch_queue_interval: Option<u64>,
    #[serde(default)]
    pub fetch_batch_size: Option<usize>,
    #[serde(default)]
    pub hexdb_base_url: Option<String>,
}
impl MappingsConfig {
    fn default_filename() -> String {
        "hex_flight_cache.json".to_string()
    }
    fn default_save_interval() -> u64 {
        300
    }
    fn default_expiry_time() -> u64 {
        300
    }
}
impl Default for MappingsConfig {
    fn default() -> Self {
        Self {
            filename: Self::default_filename(),
            save_interval: Self::default_save_interval(),
            expiry_time: Self::default_expiry_time(),
            fetch_online: false,
            fetch_mode: None,
            fetch_queue_interval: None,
            fetch_batch_size: None,
            hexdb_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    #[serde(default = "FetcherConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "FetcherConfig::default_retries")]
    pub retries: u32,
    #[serde(default = "FetcherConfig::default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}
impl FetcherConfig {
    fn default_timeout_secs() -> u64 {
        15
    }
    fn default_retries() -> u32 {
        3
    }
    fn default_retry_delay_secs() -> u64 {
        1
    }
}
impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            retries: Self::default_retries(),
            retry_delay_secs: Self::default_retry_delay_secs(),
        }
    }
}

/// Root configuration document, TOML-backed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub link: String,
    pub location: Location,
    #[serde(default = "Config::default_range_max")]
    pub range_max: f64,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub flights: FlightsConfig,
    #[serde(default)]
    pub airports: AirportsConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub mappings: MappingsConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Path to the squawk-code range table; `None` starts the registry empty.
    #[serde(default)]
    pub squawks_file: Option<String>,
    #[serde(default = "Config::default_cycle_scan_time")]
    pub cycle_scan_time_secs: u64,
}

impl Config {
    fn default_range_max() -> f64 {
        50.0
    }
    fn default_cycle_scan_time() -> u64 {
        30
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
        config.validate();
        Ok(config)
    }

    /// Logs (rather than fails startup on) configuration problems that only
    /// disable an individual filter, per the Configuration error kind.
    fn validate(&self) {
        if self.filters.specific.enabled {
            for rule in &self.filters.specific.flights {
                if regex::Regex::new(&rule.pattern).is_err() {
                    warn!(pattern = %rule.pattern, "specific filter pattern is invalid, it will be skipped");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FlightsConfig {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AirportsConfig {
    /// Path to the base airport CSV table; `None` starts the registry with
    /// only `apply` overrides.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub apply: Vec<Airport>,
}
