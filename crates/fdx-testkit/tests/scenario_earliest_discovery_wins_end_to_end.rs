//! Two weeks report the same system with different dates. Whatever order the
//! weeks are merged in, the stored first discovery is the earliest date.

use chrono::{TimeZone, Utc};
use fdx_reconcile::{reconcile, DelayPolicy, ReconcileOptions};
use fdx_store::DiscoveryStore;
use fdx_testkit::{load_discovery_script_csv, obs, ScriptedDiscoveryProvider};

fn opts() -> ReconcileOptions {
    ReconcileOptions {
        safety_weeks: 2,
        delay: DelayPolicy::none(),
    }
}

#[tokio::test]
async fn later_week_with_earlier_date_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("first_discoveries_cache.json");
    let provider = ScriptedDiscoveryProvider::new()
        .with_week("2025-06-02", vec![obs("10", "Sol", "2025-06-03 00:00:00")])
        .with_week("2025-06-09", vec![obs("10", "Sol", "2025-06-01 00:00:00")]);

    let start = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap();

    let mut store = DiscoveryStore::load(&path).unwrap();
    let report = reconcile(&mut store, &provider, start, end, &opts()).await.unwrap();

    assert_eq!(provider.calls(), vec!["2025-06-02", "2025-06-09"]);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.merged.inserted, 1);
    assert_eq!(report.merged.moved_earlier, 1);
    assert!(report.is_complete());

    let reloaded = DiscoveryStore::load(&path).unwrap();
    let sol = &reloaded.entities()["10"];
    assert_eq!(sol.first_seen_at, "2025-06-01 00:00:00");
    assert_eq!(sol.name, "Sol");
    assert!(reloaded.document().intervals.contains_key("2025-06-02"));
    assert!(reloaded.document().intervals.contains_key("2025-06-09"));
}

#[tokio::test]
async fn scripted_csv_fixture_reconciles() {
    let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/discovery_script.csv");
    let provider = load_discovery_script_csv(fixture).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut store = DiscoveryStore::load(dir.path().join("cache.json")).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap(); // mid-week
    let end = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap();

    reconcile(&mut store, &provider, start, end, &opts()).await.unwrap();

    let e = store.entities();
    assert_eq!(e.len(), 3);
    assert_eq!(e["10"].first_seen_at, "2025-06-01 09:30:00");
    assert_eq!(e["11"].first_seen_at, "2025-06-04 22:15:00");
    assert_eq!(e["12"].name, "Alioth");
}
