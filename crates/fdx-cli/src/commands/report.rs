//! `fdx enrich` and `fdx report`, plus the export step shared with harvest.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use fdx_edsm::TrafficProvider;
use fdx_report::{build_rows, enrich, summarize, write_csv, DEFAULT_TOP_N};
use fdx_schemas::{EntityRecord, TrafficRecord};
use fdx_store::{DiscoveryStore, TrafficCache};
use tracing::{info, warn};

use super::{edsm_client, load_session, Session};
use crate::RunArgs;

pub async fn run_enrich(args: &RunArgs) -> Result<()> {
    let session = load_session(args)?;
    let client = edsm_client(&session)?;
    let store = DiscoveryStore::load(&session.cfg.paths.discovery_cache)?;
    enrich_and_export(&session, &client, store.entities()).await
}

pub fn run_report(args: &RunArgs) -> Result<()> {
    let session = load_session(args)?;
    let store = DiscoveryStore::load(&session.cfg.paths.discovery_cache)?;
    export_from_caches(&session, store.entities())
}

/// Refresh traffic for `entities`, then export.
///
/// A halted enrichment still exports: systems it did not reach keep their
/// previously cached traffic, or zero. The halt is returned as
/// `ENRICH_HALTED` once the report is on disk.
pub async fn enrich_and_export(
    session: &Session,
    provider: &dyn TrafficProvider,
    entities: &BTreeMap<String, EntityRecord>,
) -> Result<()> {
    let mut cache = TrafficCache::load(&session.cfg.paths.traffic_cache)?;
    let outcome = enrich(entities, provider, &mut cache, session.cfg.traffic_delay).await?;
    export(session, entities, cache.records())?;

    if let Some(halt) = outcome.halted {
        warn!(
            system_id = %halt.system_id,
            not_refreshed = outcome.total - outcome.looked_up,
            "report exported with partial traffic"
        );
        bail!(
            "ENRICH_HALTED system_id={} looked_up={}/{} kind={}: {}",
            halt.system_id,
            outcome.looked_up,
            outcome.total,
            halt.error.kind(),
            halt.error
        );
    }
    Ok(())
}

pub fn export_from_caches(
    session: &Session,
    entities: &BTreeMap<String, EntityRecord>,
) -> Result<()> {
    let cache = TrafficCache::load(&session.cfg.paths.traffic_cache)?;
    export(session, entities, cache.records())
}

fn export(
    session: &Session,
    entities: &BTreeMap<String, EntityRecord>,
    traffic: &BTreeMap<String, TrafficRecord>,
) -> Result<()> {
    let rows = build_rows(entities, traffic);
    let path = &session.cfg.paths.report_csv;
    write_csv(path, &rows)?;
    info!(rows = rows.len(), path = %path.display(), "report written");

    println!("report_csv={}", path.display());
    print!("{}", summarize(&rows, DEFAULT_TOP_N));
    Ok(())
}
