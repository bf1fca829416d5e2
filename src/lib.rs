//! atzwatch - ADS-B ground-station event-detection pipeline.
//!
//! Polls a JSON aircraft snapshot, enriches it with derived geometry and
//! trajectory data, runs it through a pluggable filter framework, and
//! publishes the resulting alerts.

pub mod aircraft;
pub mod airport;
pub mod alerts;
pub mod category;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod geometry;
pub mod hex_flight_cache;
pub mod log_format;
pub mod preprocessor;
pub mod publisher;
pub mod scheduler;
pub mod squawks;
pub mod trajectory;

/// Base directory for runtime state (the hex→flight cache, by default),
/// following the XDG Base Directory spec in development and a fixed system
/// path when `ATZWATCH_ENV` names a deployed environment.
pub fn state_dir() -> std::path::PathBuf {
    match std::env::var("ATZWATCH_ENV").as_deref() {
        Ok("production") | Ok("staging") => std::path::PathBuf::from("/var/lib/atzwatch"),
        _ => {
            let data_home = std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                format!("{home}/.local/share")
            });
            std::path::PathBuf::from(format!("{data_home}/atzwatch"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn state_dir_uses_fixed_path_in_production() {
        unsafe {
            std::env::set_var("ATZWATCH_ENV", "production");
        }
        assert_eq!(state_dir(), std::path::PathBuf::from("/var/lib/atzwatch"));
        unsafe {
            std::env::remove_var("ATZWATCH_ENV");
        }
    }

    #[test]
    #[serial]
    fn state_dir_falls_back_to_xdg_in_development() {
        unsafe {
            std::env::remove_var("ATZWATCH_ENV");
            std::env::set_var("XDG_DATA_HOME", "/tmp/xdg-test-home");
        }
        assert_eq!(state_dir(), std::path::PathBuf::from("/tmp/xdg-test-home/atzwatch"));
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
    }
}
