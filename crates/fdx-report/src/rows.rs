//! Ranked report rows and CSV export.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use fdx_schemas::{EntityRecord, TrafficRecord};
use serde::Serialize;

pub const CSV_HEADERS: [&str; 7] = [
    "systemName",
    "systemId",
    "firstDiscoveryDate",
    "totalTraffic",
    "trafficWeek",
    "trafficDay",
    "visitedAfterDiscovery",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "systemName")]
    pub system_name: String,
    #[serde(rename = "systemId")]
    pub system_id: String,
    #[serde(rename = "firstDiscoveryDate")]
    pub first_discovery_date: String,
    #[serde(rename = "totalTraffic")]
    pub total_traffic: u64,
    #[serde(rename = "trafficWeek")]
    pub traffic_week: u64,
    #[serde(rename = "trafficDay")]
    pub traffic_day: u64,
    /// More than one visit means someone came back after the discoverer.
    #[serde(rename = "visitedAfterDiscovery")]
    pub visited_after_discovery: bool,
}

/// One row per entity, highest `total_traffic` first, ties by system id.
/// Entities without a traffic record report zero visits.
pub fn build_rows(
    entities: &BTreeMap<String, EntityRecord>,
    traffic: &BTreeMap<String, TrafficRecord>,
) -> Vec<ReportRow> {
    let zero = TrafficRecord::default();
    let mut rows: Vec<ReportRow> = entities
        .iter()
        .map(|(id, rec)| {
            let t = traffic.get(id).unwrap_or(&zero);
            ReportRow {
                system_name: rec.name.clone(),
                system_id: id.clone(),
                first_discovery_date: rec.first_seen_at.clone(),
                total_traffic: t.total,
                traffic_week: t.week,
                traffic_day: t.day,
                visited_after_discovery: t.total > 1,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_traffic
            .cmp(&a.total_traffic)
            .then_with(|| a.system_id.cmp(&b.system_id))
    });
    rows
}

/// Write `rows` as CSV. The header row is written even when `rows` is empty.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report dir failed: {}", parent.display()))?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("open report csv failed: {}", path.display()))?;

    wtr.write_record(CSV_HEADERS).context("write csv header failed")?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write csv row failed: system_id={}", row.system_id))?;
    }
    wtr.flush().context("flush report csv failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, date: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            first_seen_at: date.to_string(),
        }
    }

    fn traffic(total: u64) -> TrafficRecord {
        TrafficRecord {
            total,
            week: total / 2,
            day: 0,
            ..TrafficRecord::default()
        }
    }

    #[test]
    fn rows_sort_by_traffic_desc_then_id() {
        let mut e = BTreeMap::new();
        e.insert("3".to_string(), entity("C", "2025-06-03"));
        e.insert("1".to_string(), entity("A", "2025-06-01"));
        e.insert("2".to_string(), entity("B", "2025-06-02"));
        let mut t = BTreeMap::new();
        t.insert("1".to_string(), traffic(1));
        t.insert("2".to_string(), traffic(9));
        t.insert("3".to_string(), traffic(1));

        let rows = build_rows(&e, &t);
        let ids: Vec<&str> = rows.iter().map(|r| r.system_id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);
        assert!(rows[0].visited_after_discovery);
        assert!(!rows[1].visited_after_discovery);
    }

    #[test]
    fn missing_traffic_is_zero() {
        let mut e = BTreeMap::new();
        e.insert("7".to_string(), entity("G", "2025-06-07"));
        let rows = build_rows(&e, &BTreeMap::new());
        assert_eq!(rows[0].total_traffic, 0);
        assert_eq!(rows[0].traffic_week, 0);
        assert!(!rows[0].visited_after_discovery);
    }
}
