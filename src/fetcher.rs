//! Polls the configured snapshot URL, retrying transient failures, and
//! substitutes any missing `flight` field from the hex→flight cache before
//! handing the snapshot to the preprocessor.

use crate::aircraft::AircraftSnapshot;
use crate::config::FetcherConfig;
use crate::hex_flight_cache::{placeholder, HexFlightCache, Source};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Fetcher {
    client: Client,
    url: String,
    retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(url: impl Into<String>, conf: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(conf.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            retries: conf.retries,
            retry_delay: Duration::from_secs(conf.retry_delay_secs),
        })
    }

    async fn fetch_once(&self) -> Result<AircraftSnapshot> {
        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("sending snapshot request")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("snapshot endpoint returned HTTP {status}"));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/json") {
            return Err(anyhow!("snapshot endpoint returned content-type {content_type:?}"));
        }

        let body = resp.text().await.context("reading snapshot body")?;
        let snapshot: AircraftSnapshot =
            serde_json::from_str(&body).context("parsing snapshot JSON")?;
        Ok(snapshot)
    }

    /// Fetches one snapshot, retrying up to `retries` times with a linearly
    /// growing delay (`attempt * retryDelay`). Attaches `timestamp` and
    /// `aircraftCount`, trims flight fields, and substitutes missing flights
    /// from `cache`.
    pub async fn fetch(&self, cache: &HexFlightCache) -> Result<AircraftSnapshot> {
        let mut last_err = None;
        for attempt in 0..=self.retries {
            if attempt > 0 {
                let delay = self.retry_delay * attempt;
                debug!(attempt, delay_secs = delay.as_secs(), "retrying snapshot fetch");
                tokio::time::sleep(delay).await;
            }
            match self.fetch_once().await {
                Ok(snapshot) => return Ok(self.finalize(snapshot, cache)),
                Err(e) => {
                    warn!(attempt, error = %e, "snapshot fetch attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("snapshot fetch failed with no error recorded")))
    }

    fn finalize(&self, mut snapshot: AircraftSnapshot, cache: &HexFlightCache) -> AircraftSnapshot {
        let now = Utc::now();
        snapshot.timestamp = Some(now);
        snapshot.aircraft_count = Some(snapshot.aircraft.len());

        for aircraft in &mut snapshot.aircraft {
            aircraft.flight = aircraft.flight.as_ref().map(|f| f.trim().to_string());
            match &aircraft.flight {
                Some(f) if !f.is_empty() => {
                    cache.insert(&aircraft.hex, f, now, Source::Local);
                }
                _ => {
                    aircraft.flight = Some(
                        cache.lookup(&aircraft.hex).unwrap_or_else(|| placeholder(&aircraft.hex)),
                    );
                }
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_trimmed_when_present() {
        let cache = HexFlightCache::new("/tmp/unused-test-cache.json");
        let fetcher = Fetcher::new("http://example.invalid", &FetcherConfig::default()).unwrap();
        let mut snapshot = AircraftSnapshot {
            aircraft: vec![crate::filters::test_aircraft("ABC123")],
            ..Default::default()
        };
        snapshot.aircraft[0].flight = Some("  BAW1  ".to_string());
        let finalized = fetcher.finalize(snapshot, &cache);
        assert_eq!(finalized.aircraft[0].flight.as_deref(), Some("BAW1"));
    }

    #[test]
    fn missing_flight_substituted_from_cache() {
        let cache = HexFlightCache::new("/tmp/unused-test-cache2.json");
        cache.insert("ABC123", "BAW1", Utc::now(), Source::Local);
        let fetcher = Fetcher::new("http://example.invalid", &FetcherConfig::default()).unwrap();
        let snapshot = AircraftSnapshot {
            aircraft: vec![crate::filters::test_aircraft("ABC123")],
            ..Default::default()
        };
        let finalized = fetcher.finalize(snapshot, &cache);
        assert_eq!(finalized.aircraft[0].flight.as_deref(), Some("BAW1"));
    }

    #[test]
    fn missing_flight_without_cache_entry_uses_placeholder() {
        let cache = HexFlightCache::new("/tmp/unused-test-cache3.json");
        let fetcher = Fetcher::new("http://example.invalid", &FetcherConfig::default()).unwrap();
        let snapshot = AircraftSnapshot {
            aircraft: vec![crate::filters::test_aircraft("ABC123")],
            ..Default::default()
        };
        let finalized = fetcher.finalize(snapshot, &cache);
        assert_eq!(finalized.aircraft[0].flight.as_deref(), Some("[ABC123]"));
    }
}
