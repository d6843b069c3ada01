//! fdx-schemas
//!
//! Shared data types for the first-discovery harvester. Pure data: no IO,
//! no network, no clock reads.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk layout version of the discovery store.
pub const STORE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// A fixed 7-day UTC window, the unit of fetch and cache granularity.
///
/// Intervals produced by the generator always start on a Monday at
/// 00:00:00 UTC and satisfy `end == start + 7 days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn week_starting(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::days(7),
        }
    }

    /// Cache identity: the ISO date of `start` (`YYYY-MM-DD`).
    pub fn key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `true` when this window shares any instant with `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.end > from && self.start < to
    }
}

// ---------------------------------------------------------------------------
// Observations and stored records
// ---------------------------------------------------------------------------

/// One first-discovery event as reported by the upstream log API.
///
/// `date` is kept verbatim (`YYYY-MM-DD HH:MM:SS` for EDSM) because the
/// merger compares canonical timestamp strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub name: String,
    pub date: String,
}

impl Observation {
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            date: date.into(),
        }
    }
}

/// Best-known facts about one discovered system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    /// Earliest observed discovery timestamp. Only ever moves earlier.
    #[serde(rename = "firstDiscoveryDate")]
    pub first_seen_at: String,
}

/// Presence of a key means the interval has been fetched since its last
/// invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub version: u32,
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
        }
    }
}

/// Whole persisted discovery store.
///
/// Maps are ordered so that the serialized snapshot is byte-stable for a
/// given logical state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub meta: StoreMeta,
    #[serde(default)]
    pub intervals: BTreeMap<String, IntervalRecord>,
    /// Older caches named this map `systems`.
    #[serde(default, alias = "systems")]
    pub entities: BTreeMap<String, EntityRecord>,
}

impl StoreDocument {
    pub fn is_fetched(&self, interval: &Interval) -> bool {
        self.intervals.contains_key(&interval.key())
    }
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

/// Visit counters for one system, as cached by the enrichment phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRecord {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub week: u64,
    #[serde(default)]
    pub day: u64,
    /// Visits per ship type.
    #[serde(default)]
    pub breakdown: BTreeMap<String, u64>,
}
