//! Typed harvester settings extracted from the merged config document.
//!
//! Every key is optional; absent keys take the documented default. Present
//! keys with the wrong type are rejected rather than silently defaulted.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.edsm.net";
pub const DEFAULT_START_DATE: &str = "2025-01-01";

/// Adaptive inter-request delay for the discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySettings {
    /// Candidate count above which `long` is used instead of `short`.
    pub threshold: usize,
    pub short: Duration,
    pub long: Duration,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            threshold: 360,
            short: Duration::from_millis(400),
            long: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub discovery_cache: PathBuf,
    pub traffic_cache: PathBuf,
    pub report_csv: PathBuf,
}

/// Effective settings for one harvester process. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Inclusive start of the harvested range (00:00:00 UTC).
    pub start_date: NaiveDate,
    /// Number of trailing weeks re-fetched on every run.
    pub safety_weeks: u32,
    pub discovery_delay: DelaySettings,
    pub traffic_delay: Duration,
    pub paths: CachePaths,
}

impl HarvestConfig {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let base_url = read_string(config, "/edsm/base_url", DEFAULT_BASE_URL)?;
        let request_timeout_secs = read_u64(config, "/edsm/request_timeout_secs", 30)?;

        let start_raw = read_string(config, "/harvest/start_date", DEFAULT_START_DATE)?;
        let start_date = NaiveDate::parse_from_str(&start_raw, "%Y-%m-%d").with_context(|| {
            format!("CONFIG_INVALID /harvest/start_date must be YYYY-MM-DD, got '{start_raw}'")
        })?;

        let safety_weeks = read_u64(config, "/harvest/safety_weeks", 2)?;
        let safety_weeks = u32::try_from(safety_weeks)
            .with_context(|| format!("CONFIG_INVALID /harvest/safety_weeks out of range: {safety_weeks}"))?;

        let defaults = DelaySettings::default();
        let discovery_delay = DelaySettings {
            threshold: read_u64(config, "/harvest/delay/threshold", defaults.threshold as u64)? as usize,
            short: Duration::from_millis(read_u64(
                config,
                "/harvest/delay/short_ms",
                defaults.short.as_millis() as u64,
            )?),
            long: Duration::from_millis(read_u64(
                config,
                "/harvest/delay/long_ms",
                defaults.long.as_millis() as u64,
            )?),
        };
        let traffic_delay = Duration::from_millis(read_u64(config, "/traffic/delay_ms", 400)?);

        let paths = CachePaths {
            discovery_cache: PathBuf::from(read_string(
                config,
                "/paths/discovery_cache",
                "first_discoveries_cache.json",
            )?),
            traffic_cache: PathBuf::from(read_string(
                config,
                "/paths/traffic_cache",
                "traffic_cache.json",
            )?),
            report_csv: PathBuf::from(read_string(
                config,
                "/paths/report_csv",
                "edsm_first_discoveries_traffic.csv",
            )?),
        };

        let cfg = HarvestConfig {
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            start_date,
            safety_weeks,
            discovery_delay,
            traffic_delay,
            paths,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would make a run meaningless or unsafe.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID /edsm/base_url is empty");
        }
        if self.request_timeout.is_zero() {
            bail!("CONFIG_INVALID /edsm/request_timeout_secs must be > 0");
        }
        if self.discovery_delay.long < self.discovery_delay.short {
            bail!(
                "CONFIG_INVALID /harvest/delay/long_ms ({}) is shorter than short_ms ({})",
                self.discovery_delay.long.as_millis(),
                self.discovery_delay.short.as_millis()
            );
        }
        for (name, p) in [
            ("discovery_cache", &self.paths.discovery_cache),
            ("traffic_cache", &self.paths.traffic_cache),
            ("report_csv", &self.paths.report_csv),
        ] {
            if p.as_os_str().is_empty() {
                bail!("CONFIG_INVALID /paths/{name} is empty");
            }
        }
        if self.paths.discovery_cache == self.paths.traffic_cache {
            bail!("CONFIG_INVALID /paths/discovery_cache and /paths/traffic_cache must differ");
        }
        Ok(())
    }
}

fn read_string(config: &Value, pointer: &str, default: &str) -> Result<String> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                bail!("CONFIG_INVALID {pointer} is empty");
            }
            Ok(t.to_string())
        }
        Some(other) => bail!("CONFIG_INVALID {pointer} must be a string, got {other}"),
    }
}

fn read_u64(config: &Value, pointer: &str, default: u64) -> Result<u64> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .with_context(|| format!("CONFIG_INVALID {pointer} must be a non-negative integer, got {v}")),
    }
}
