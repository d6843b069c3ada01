//! `fdx plan` and `fdx harvest`: the discovery pass.

use anyhow::Result;
use fdx_reconcile::{plan, reconcile, ReconcileOptions};
use fdx_store::DiscoveryStore;
use tracing::warn;

use super::{delay_policy, edsm_client, load_session, resolve_range};
use crate::RunArgs;

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

pub fn run_plan(args: &RunArgs) -> Result<()> {
    let session = load_session(args)?;
    let (start, end) = resolve_range(args, &session.cfg)?;
    let policy = delay_policy(&session.cfg.discovery_delay);

    let store = DiscoveryStore::load(&session.cfg.paths.discovery_cache)?;
    // work on a copy: a dry run never mutates or persists the store
    let mut doc = store.document().clone();
    let p = plan(&mut doc, start, end, session.cfg.safety_weeks, &policy);

    println!("config_hash={}", session.loaded.config_hash);
    println!("range_start={} range_end={}", start.to_rfc3339(), end.to_rfc3339());
    println!(
        "invalidated={} candidates={} already_fetched={} delay_ms={} long_delay={}",
        p.invalidated.len(),
        p.candidates.len(),
        p.already_fetched,
        p.delay.as_millis(),
        p.long_delay
    );
    for key in &p.invalidated {
        println!("invalidate={key}");
    }
    for iv in &p.candidates {
        println!("candidate={}", iv.key());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// harvest
// ---------------------------------------------------------------------------

pub async fn run_harvest(args: &RunArgs, skip_traffic: bool) -> Result<()> {
    let session = load_session(args)?;
    let client = edsm_client(&session)?;
    let (start, end) = resolve_range(args, &session.cfg)?;

    let mut store = DiscoveryStore::load(&session.cfg.paths.discovery_cache)?;
    let opts = ReconcileOptions {
        safety_weeks: session.cfg.safety_weeks,
        delay: delay_policy(&session.cfg.discovery_delay),
    };
    let report = reconcile(&mut store, &client, start, end, &opts).await?;

    println!(
        "fetched={} planned={} pending={} entities={} inserted={} moved_earlier={}",
        report.fetched,
        report.planned,
        report.pending(),
        report.entities.len(),
        report.merged.inserted,
        report.merged.moved_earlier
    );
    for f in &report.failed {
        println!("failed_interval={} kind={}", f.key, f.error.kind());
    }
    if let Some(key) = &report.rate_limited_at {
        warn!(interval = %key, "discovery pass stopped by rate limiting; rerun later");
    }

    if skip_traffic {
        return super::report::export_from_caches(&session, &report.entities);
    }
    super::report::enrich_and_export(&session, &client, &report.entities).await
}
