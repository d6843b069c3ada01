//! Traffic enrichment phase.
//!
//! Walks discovered systems in id order, one lookup at a time, persisting the
//! traffic cache after every lookup. The first lookup failure halts the
//! phase: what was collected stays in the cache, discovery data is never
//! touched, and the caller decides whether a partial report is acceptable.

use std::collections::BTreeMap;
use std::time::Duration;

use fdx_edsm::{ProviderError, TrafficProvider};
use fdx_schemas::EntityRecord;
use fdx_store::{StoreError, TrafficCache};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichHalt {
    pub system_id: String,
    pub error: ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOutcome {
    pub looked_up: usize,
    pub total: usize,
    pub halted: Option<EnrichHalt>,
}

impl EnrichOutcome {
    pub fn is_complete(&self) -> bool {
        self.halted.is_none() && self.looked_up == self.total
    }
}

pub async fn enrich(
    entities: &BTreeMap<String, EntityRecord>,
    provider: &dyn TrafficProvider,
    cache: &mut TrafficCache,
    delay: Duration,
) -> Result<EnrichOutcome, StoreError> {
    let total = entities.len();
    let mut outcome = EnrichOutcome {
        looked_up: 0,
        total,
        halted: None,
    };
    info!(systems = total, "traffic enrichment started");

    for (i, system_id) in entities.keys().enumerate() {
        match provider.fetch_traffic(system_id).await {
            Ok(record) => {
                cache.insert(system_id.clone(), record);
                cache.persist()?;
                outcome.looked_up += 1;
            }
            Err(e) => {
                error!(
                    system_id = %system_id,
                    kind = e.kind(),
                    looked_up = outcome.looked_up,
                    "traffic lookup failed; halting enrichment: {e}"
                );
                outcome.halted = Some(EnrichHalt {
                    system_id: system_id.clone(),
                    error: e,
                });
                break;
            }
        }

        if i + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        looked_up = outcome.looked_up,
        total,
        halted = outcome.halted.is_some(),
        "traffic enrichment finished"
    );
    Ok(outcome)
}
