//! Unused-key guard.
//!
//! "Consumed pointers" are JSON Pointer prefixes read by [`crate::HarvestConfig`]
//! and [`crate::resolve_credentials`]. Any leaf of the effective config not
//! under one of them is reported as unused, which catches typos such as
//! `safety_week:` silently falling back to the default.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::collect_leaf_pointers;

/// Registry of pointers the code actually reads. Keep in sync with
/// `harvest.rs` and `secrets.rs`.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/edsm/base_url",
    "/edsm/request_timeout_secs",
    "/edsm/keys_env/commander",
    "/edsm/keys_env/api_key",
    "/harvest/start_date",
    "/harvest/safety_weeks",
    "/harvest/delay/threshold",
    "/harvest/delay/short_ms",
    "/harvest/delay/long_ms",
    "/traffic/delay_ms",
    "/paths/discovery_cache",
    "/paths/traffic_cache",
    "/paths/report_csv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Produce an unused-key report for the effective config.
/// With `UnusedKeyPolicy::Fail`, unused keys are an error.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<&str> = CONSUMED_POINTERS.iter().copied().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        // The empty document collapses to the root pointer; nothing to report.
        .filter(|lp| lp != "/")
        .filter(|lp| !consumed.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.iter().take(12).collect::<Vec<_>>()
        );
    }

    Ok(report)
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}
