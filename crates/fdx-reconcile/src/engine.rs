//! Reconciliation engine: executes a [`ReconcilePlan`] against a provider.
//!
//! Strictly sequential. One interval is fetched, merged, recorded and
//! persisted before the next request is sent; the last successful persist
//! is the recovery point if the process dies mid-run.
//!
//! Failure handling per interval:
//! - transport / api / decode failure: logged, interval left unmarked (it is
//!   a candidate again next run), pass continues
//! - rate limited: logged, pass stops; every remaining candidate stays
//!   unmarked
//! - persist failure: fatal, returned to the caller

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fdx_edsm::{DiscoveryProvider, ProviderError};
use fdx_schemas::{EntityRecord, IntervalRecord};
use fdx_store::{DiscoveryStore, StoreError};
use tracing::{info, warn};

use crate::merge::{merge_all, MergeTally};
use crate::plan::{plan, DelayPolicy, ReconcilePlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub safety_weeks: u32,
    pub delay: DelayPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            safety_weeks: 2,
            delay: DelayPolicy::default(),
        }
    }
}

/// An interval whose fetch failed this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedInterval {
    pub key: String,
    pub error: ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub invalidated: usize,
    pub planned: usize,
    pub already_fetched: usize,
    /// Intervals fetched, merged and persisted.
    pub fetched: usize,
    pub failed: Vec<FailedInterval>,
    /// Key of the interval that was rate limited, if the pass stopped early.
    pub rate_limited_at: Option<String>,
    pub merged: MergeTally,
    /// Full entity map after the run.
    pub entities: BTreeMap<String, EntityRecord>,
}

impl ReconcileReport {
    /// Candidates that are still unmarked and will be retried next run.
    pub fn pending(&self) -> usize {
        self.planned - self.fetched
    }

    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }
}

/// Bring `store` up to date with `provider` for `[start, end)`.
pub async fn reconcile(
    store: &mut DiscoveryStore,
    provider: &dyn DiscoveryProvider,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    opts: &ReconcileOptions,
) -> Result<ReconcileReport, StoreError> {
    let p = plan(store.document_mut(), start, end, opts.safety_weeks, &opts.delay);
    execute(store, provider, p).await
}

/// Execute an already computed plan. `store` must be the document the plan
/// was computed against.
pub async fn execute(
    store: &mut DiscoveryStore,
    provider: &dyn DiscoveryProvider,
    plan: ReconcilePlan,
) -> Result<ReconcileReport, StoreError> {
    let total = plan.candidates.len();
    info!(
        provider = provider.name(),
        candidates = total,
        invalidated = plan.invalidated.len(),
        already_fetched = plan.already_fetched,
        delay_ms = plan.delay.as_millis() as u64,
        "reconcile plan"
    );
    if plan.long_delay {
        warn!(
            candidates = total,
            delay_ms = plan.delay.as_millis() as u64,
            "large backlog; using long inter-request delay"
        );
    }

    let mut report = ReconcileReport {
        invalidated: plan.invalidated.len(),
        planned: total,
        already_fetched: plan.already_fetched,
        fetched: 0,
        failed: Vec::new(),
        rate_limited_at: None,
        merged: MergeTally::default(),
        entities: BTreeMap::new(),
    };

    for (i, iv) in plan.candidates.iter().enumerate() {
        let key = iv.key();
        match provider.fetch_first_discoveries(iv).await {
            Ok(observations) => {
                let doc = store.document_mut();
                let tally = merge_all(&mut doc.entities, &observations);
                doc.intervals.insert(
                    key.clone(),
                    IntervalRecord {
                        fetched_at: Utc::now(),
                    },
                );
                store.persist()?;

                report.fetched += 1;
                report.merged.add(tally);
                info!(
                    interval = %key,
                    progress = %format!("{}/{}", i + 1, total),
                    records = observations.len(),
                    inserted = tally.inserted,
                    moved_earlier = tally.moved_earlier,
                    "interval merged"
                );
            }
            Err(ProviderError::RateLimited(msg)) => {
                warn!(
                    interval = %key,
                    kind = "rate_limited",
                    remaining = total - i,
                    "upstream rate limit; stopping pass, remaining intervals retry next run: {msg}"
                );
                report.rate_limited_at = Some(key);
                break;
            }
            Err(e) => {
                if e.is_malformed_response() {
                    warn!(interval = %key, kind = e.kind(), "unexpected upstream payload; interval left unmarked: {e}");
                } else {
                    warn!(interval = %key, kind = e.kind(), "fetch failed; interval left unmarked: {e}");
                }
                report.failed.push(FailedInterval { key, error: e });
            }
        }

        if i + 1 < total && !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }
    }

    report.entities = store.entities().clone();
    info!(
        fetched = report.fetched,
        failed = report.failed.len(),
        pending = report.pending(),
        entities = report.entities.len(),
        "reconcile finished"
    );
    Ok(report)
}
