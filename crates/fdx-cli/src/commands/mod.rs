//! Command handler modules for fdx-cli.
//!
//! Shared config/range plumbing lives here. Command-specific logic lives in
//! the submodules.

pub mod harvest;
pub mod report;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fdx_config::{
    report_unused_keys, resolve_credentials, DelaySettings, HarvestConfig, LoadedConfig,
    UnusedKeyPolicy,
};
use fdx_edsm::EdsmClient;
use fdx_reconcile::{DelayPolicy, IntoUtc};
use tracing::{info, warn};

use crate::RunArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Effective configuration for one command invocation.
pub struct Session {
    pub loaded: LoadedConfig,
    pub cfg: HarvestConfig,
}

/// Load layered config, apply CLI overrides and report unused keys.
pub fn load_session(args: &RunArgs) -> Result<Session> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = fdx_config::load_layered_yaml(&path_refs)?;

    let policy = if args.strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            warn!(unused = %p, "CONFIG_UNUSED_KEYS");
        }
    }

    let mut cfg = HarvestConfig::from_config_json(&loaded.config_json)?;
    if let Some(raw) = &args.start {
        cfg.start_date = parse_date(raw).context("invalid --start")?;
    }
    if let Some(weeks) = args.safety_weeks {
        cfg.safety_weeks = weeks;
    }

    info!(config_hash = %loaded.config_hash, "config loaded");
    Ok(Session { loaded, cfg })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{raw}'"))
}

/// `--end` accepts a plain date (00:00:00 UTC) or an RFC 3339 timestamp.
pub fn parse_end(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.into_utc());
    }
    let dt = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("expected YYYY-MM-DD or RFC 3339, got '{raw}'"))?;
    Ok(dt.into_utc())
}

/// `[start_date 00:00 UTC, --end or now)`.
pub fn resolve_range(args: &RunArgs, cfg: &HarvestConfig) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = cfg.start_date.into_utc();
    let end = match &args.end {
        Some(raw) => parse_end(raw).context("invalid --end")?,
        None => Utc::now(),
    };
    Ok((start, end))
}

pub fn delay_policy(settings: &DelaySettings) -> DelayPolicy {
    DelayPolicy {
        threshold: settings.threshold,
        short: settings.short,
        long: settings.long,
    }
}

/// Resolve credentials and build the EDSM client. Fails before any request
/// is sent when credentials are missing.
pub fn edsm_client(session: &Session) -> Result<EdsmClient> {
    let creds = resolve_credentials(&session.loaded.config_json)?;
    let client = EdsmClient::new(
        creds.commander,
        creds.api_key,
        session.cfg.base_url.clone(),
        session.cfg.request_timeout,
    )?;
    Ok(client)
}
