//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! surf-config.toml file: which NOAA station to read, where the sun events are
//! computed, the tide band a session considers good, and cache timing.
//!
//! Every section has defaults, so a partial file only overrides what it names.

use crate::scanner::{ThresholdOptions, DEFAULT_STEP_MINUTES};
use crate::sun::{Place, SANTA_CRUZ};
use crate::tide_data::SANTA_CRUZ_STATION;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "surf-config.toml";

/// Application configuration loaded from surf-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// NOAA station configuration
    #[serde(default)]
    pub station: StationConfig,
    /// Where sunrise and sunset are computed
    #[serde(default)]
    pub place: Place,
    /// Tide band and scan timing
    #[serde(default)]
    pub scan: ScanConfig,
    /// Prediction cache timing
    #[serde(default)]
    pub cache: CacheConfig,
}

/// NOAA tide station configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "9413745" for Santa Cruz, CA)
    pub id: String,
    /// Human-readable station name for reference
    pub name: String,
}

/// Window scan configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Lowest acceptable tide in feet; unset means no lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_tide: Option<f64>,
    /// Highest acceptable tide in feet; unset uses the scanner default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_tide: Option<f64>,
    /// Usable light before sunrise and after sunset
    pub twilight_minutes: i64,
    /// Distance between scan samples
    pub step_minutes: i64,
    /// Days ahead to report windows for
    pub forecast_days: u32,
}

/// Prediction cache configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched response stays valid
    pub ttl_hours: u64,
    /// How often expired responses are swept
    pub sweep_minutes: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            id: SANTA_CRUZ_STATION.to_string(),
            name: "Santa Cruz, CA".to_string(),
        }
    }
}

impl Default for Place {
    fn default() -> Self {
        SANTA_CRUZ
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            low_tide: None,
            high_tide: None,
            twilight_minutes: crate::daylight::DEFAULT_TWILIGHT_MINUTES,
            step_minutes: DEFAULT_STEP_MINUTES,
            forecast_days: 7,
        }
    }
}

impl ScanConfig {
    /// Configured tide band, before defaults are filled in.
    pub fn threshold_options(&self) -> ThresholdOptions {
        ThresholdOptions {
            low_tide: self.low_tide,
            high_tide: self.high_tide,
        }
    }

    /// Twilight margin, or `None` when `twilight_minutes` is out of range.
    pub fn twilight(&self) -> Option<Duration> {
        Duration::try_minutes(self.twilight_minutes)
    }

    /// Scan step, or `None` when `step_minutes` is out of range.
    pub fn step(&self) -> Option<Duration> {
        Duration::try_minutes(self.step_minutes)
    }

    pub fn forecast(&self) -> Option<Duration> {
        Duration::try_days(i64::from(self.forecast_days))
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> StdDuration {
        StdDuration::from_secs(self.ttl_hours.saturating_mul(3600))
    }

    /// Sweep period, at least one minute.
    pub fn sweep_period(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_minutes.max(1).saturating_mul(60))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_hours: 12,
            sweep_minutes: 30,
        }
    }
}

impl Config {
    /// Load configuration from surf-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(station = %config.station.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Write this configuration as TOML to `path`
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
