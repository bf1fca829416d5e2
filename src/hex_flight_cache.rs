//! Hex→flight persistence cache: keeps the last known callsign for a hex
//! across snapshots so a feeder drop-out doesn't blank the identifier, and
//! round-trips to disk so restarts don't lose history. The optional online
//! lookup (`fetchOnline`/`hexdbBaseUrl`) is out of scope here; only the
//! in-memory map and its disk format are implemented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

const CACHE_VERSION: u32 = 2;

/// Placeholder substituted for a hex with no known flight.
pub fn placeholder(hex: &str) -> String {
    format!("[{hex}]")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Online,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default, rename = "Registration")]
    pub registration: Option<String>,
    #[serde(default, rename = "Manufacturer")]
    pub manufacturer: Option<String>,
    #[serde(default, rename = "Type")]
    pub aircraft_type: Option<String>,
    #[serde(default, rename = "ICAOTypeCode")]
    pub icao_type_code: Option<String>,
    #[serde(default, rename = "RegisteredOwners")]
    pub registered_owners: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedFile {
    version: u32,
    timestamp: DateTime<Utc>,
    mappings: HashMap<String, String>,
    timestamps: HashMap<String, i64>,
    sources: HashMap<String, Source>,
    #[serde(default)]
    additional_data: HashMap<String, AdditionalData>,
}

#[derive(Debug, Default)]
struct Inner {
    mappings: HashMap<String, String>,
    timestamps: HashMap<String, i64>,
    sources: HashMap<String, Source>,
    additional_data: HashMap<String, AdditionalData>,
}

/// A single lock around the whole map; the worker mutates it while
/// processing aircraft, a background save timer reads it to flush to disk.
pub struct HexFlightCache {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl HexFlightCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), inner: RwLock::new(Inner::default()) }
    }

    /// Loads from disk, rejecting and starting empty on a version mismatch
    /// or any parse error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = Self::new(path.clone());
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<PersistedFile>(&text) {
                Ok(file) if file.version == CACHE_VERSION => {
                    let mut inner = cache.inner.write().unwrap();
                    inner.mappings = file.mappings;
                    inner.timestamps = file.timestamps;
                    inner.sources = file.sources;
                    inner.additional_data = file.additional_data;
                    info!(path = %path.display(), entries = inner.mappings.len(), "loaded hex-flight cache");
                }
                Ok(file) => {
                    warn!(found = file.version, expected = CACHE_VERSION, "hex-flight cache version mismatch, starting empty");
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "failed to parse hex-flight cache, starting empty");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %path.display(), "failed to read hex-flight cache"),
        }
        cache
    }

    pub fn lookup(&self, hex: &str) -> Option<String> {
        self.inner.read().unwrap().mappings.get(hex).cloned()
    }

    pub fn insert(&self, hex: &str, flight: &str, now: DateTime<Utc>, source: Source) {
        let mut inner = self.inner.write().unwrap();
        inner.mappings.insert(hex.to_string(), flight.trim().to_string());
        inner.timestamps.insert(hex.to_string(), now.timestamp_millis());
        inner.sources.insert(hex.to_string(), source);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the current map and writes it out, overwriting any
    /// existing file. Called by the save timer and on graceful shutdown.
    pub fn save(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let inner = self.inner.read().unwrap();
        let file = PersistedFile {
            version: CACHE_VERSION,
            timestamp: now,
            mappings: inner.mappings.clone(),
            timestamps: inner.timestamps.clone(),
            sources: inner.sources.clone(),
            additional_data: inner.additional_data.clone(),
        };
        drop(inner);
        let json = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = Path::new(&self.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn round_trips_through_disk() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        let cache = HexFlightCache::new(&path);
        let now = Utc::now();
        cache.insert("ABC123", "BAW123", now, Source::Local);
        cache.save(now).unwrap();

        let reloaded = HexFlightCache::load(&path);
        assert_eq!(reloaded.lookup("ABC123"), Some("BAW123".to_string()));
    }

    #[test]
    fn version_mismatch_starts_empty() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{"version":1,"timestamp":"2024-01-01T00:00:00Z","mappings":{"X":"Y"},"timestamps":{},"sources":{}}"#).unwrap();
        let cache = HexFlightCache::load(tmp.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_file_starts_empty() {
        let cache = HexFlightCache::load("/nonexistent/path/cache.json");
        assert!(cache.is_empty());
    }

    #[test]
    fn placeholder_format() {
        assert_eq!(placeholder("ABC123"), "[ABC123]");
    }
}
