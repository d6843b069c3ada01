//! Scripted providers and fixture loaders for cross-crate scenarios.
//!
//! Nothing here touches the network. Responses are keyed by interval key
//! (`YYYY-MM-DD` of the Monday) or by system id; anything not scripted
//! answers with an empty result.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fdx_edsm::{DiscoveryProvider, ProviderError, TrafficProvider};
use fdx_schemas::{Interval, Observation, TrafficRecord};

pub fn obs(entity_id: &str, name: &str, date: &str) -> Observation {
    Observation::new(entity_id, name, date)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedDiscoveryProvider {
    responses: BTreeMap<String, Result<Vec<Observation>, ProviderError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDiscoveryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_week(mut self, key: &str, observations: Vec<Observation>) -> Self {
        self.responses.insert(key.to_string(), Ok(observations));
        self
    }

    pub fn with_failure(mut self, key: &str, err: ProviderError) -> Self {
        self.responses.insert(key.to_string(), Err(err));
        self
    }

    /// Interval keys requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DiscoveryProvider for ScriptedDiscoveryProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_first_discoveries(
        &self,
        interval: &Interval,
    ) -> Result<Vec<Observation>, ProviderError> {
        let key = interval.key();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedTrafficProvider {
    responses: BTreeMap<String, Result<TrafficRecord, ProviderError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTrafficProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(mut self, system_id: &str, total: u64) -> Self {
        self.responses.insert(
            system_id.to_string(),
            Ok(TrafficRecord {
                total,
                ..TrafficRecord::default()
            }),
        );
        self
    }

    pub fn with_failure(mut self, system_id: &str, err: ProviderError) -> Self {
        self.responses.insert(system_id.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TrafficProvider for ScriptedTrafficProvider {
    async fn fetch_traffic(&self, system_id: &str) -> Result<TrafficRecord, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(system_id.to_string());
        }
        self.responses
            .get(system_id)
            .cloned()
            .unwrap_or_else(|| Ok(TrafficRecord::default()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Load a scripted discovery provider from CSV rows
/// `week,system_id,system_name,date` (header required).
pub fn load_discovery_script_csv(path: &str) -> Result<ScriptedDiscoveryProvider> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("open discovery script: {path}"))?;

    let mut weeks: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("read discovery script row {}", i + 1))?;
        if rec.len() != 4 {
            anyhow::bail!("discovery script row {} has {} fields, expected 4", i + 1, rec.len());
        }
        weeks
            .entry(rec[0].to_string())
            .or_default()
            .push(obs(&rec[1], &rec[2], &rec[3]));
    }

    Ok(weeks
        .into_iter()
        .fold(ScriptedDiscoveryProvider::new(), |p, (week, observations)| {
            p.with_week(&week, observations)
        }))
}
