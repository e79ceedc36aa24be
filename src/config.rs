use crate::error::ConfigError;
use crate::probe::{DEFAULT_FALLBACK, DEFAULT_TIMEOUT, ProbeOptions};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const CONFIG_FILE: &str = "ring_radio.json";
pub const DEFAULT_PLAYLIST: &str = "ring1.json";
const MAX_TICK_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Station settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Phase zero of the broadcast cycle.
    pub anchor: DateTime<Utc>,
    pub playlist: PathBuf,
    /// Seconds assumed for a track whose duration cannot be read.
    pub fallback_secs: f64,
    /// Per-track probe limit in seconds (0 = wait forever).
    pub probe_timeout_secs: f64,
    pub tick_interval_ms: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            anchor: default_anchor(),
            playlist: PathBuf::from(DEFAULT_PLAYLIST),
            fallback_secs: DEFAULT_FALLBACK.as_secs_f64(),
            probe_timeout_secs: DEFAULT_TIMEOUT.as_secs_f64(),
            tick_interval_ms: 1000,
        }
    }
}

fn secs_to_duration(what: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::Invalid(format!("{} of {}s is out of range: {}", what, secs, e)))
}

fn default_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 16, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl StationConfig {
    /// Load settings from `path`, or from `ring_radio.json` when `path` is None.
    ///
    /// A missing default file yields defaults. An explicitly named file must
    /// exist. A file that exists but cannot be read or parsed is reported and
    /// replaced by defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(CONFIG_FILE), false),
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            return Ok(StationConfig::default());
        }
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(path = %path.display(), error = %e, "corrupt config file, using defaults"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "could not read config file, using defaults"),
        }
        Ok(StationConfig::default())
    }

    /// Parse an RFC 3339 timestamp (e.g. `2025-11-16T00:00:00Z`) into an anchor.
    pub fn parse_anchor(value: &str) -> Result<DateTime<Utc>, ConfigError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| ConfigError::Anchor {
                value: value.to_string(),
                source,
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fallback_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fallback duration must be positive, got {}",
                self.fallback_secs
            )));
        }
        secs_to_duration("fallback duration", self.fallback_secs)?;
        if !(self.probe_timeout_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "probe timeout must be >= 0, got {}",
                self.probe_timeout_secs
            )));
        }
        secs_to_duration("probe timeout", self.probe_timeout_secs)?;
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "tick interval must be between 1 and {} ms, got {}",
                MAX_TICK_INTERVAL_MS, self.tick_interval_ms
            )));
        }
        Ok(())
    }

    /// Probe settings derived from this config.
    pub fn probe_options(&self) -> Result<ProbeOptions, ConfigError> {
        let fallback = secs_to_duration("fallback duration", self.fallback_secs)?;
        let timeout = if self.probe_timeout_secs > 0.0 {
            Some(secs_to_duration("probe timeout", self.probe_timeout_secs)?)
        } else {
            None
        };
        Ok(ProbeOptions { fallback, timeout })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
