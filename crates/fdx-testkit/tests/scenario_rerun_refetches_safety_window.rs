//! A warm rerun only asks the provider for the trailing safety window.

use chrono::{TimeZone, Utc};
use fdx_reconcile::{reconcile, DelayPolicy, ReconcileOptions};
use fdx_store::DiscoveryStore;
use fdx_testkit::{obs, ScriptedDiscoveryProvider};

#[tokio::test]
async fn warm_run_fetches_exactly_the_safety_weeks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let start = Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap(); // Monday
    let opts = ReconcileOptions {
        safety_weeks: 2,
        delay: DelayPolicy::none(),
    };

    let cold = ScriptedDiscoveryProvider::new()
        .with_week("2025-05-12", vec![obs("1", "Alpha", "2025-05-13 00:00:00")]);
    let mut store = DiscoveryStore::load(&path).unwrap();
    let first = reconcile(&mut store, &cold, start, end, &opts).await.unwrap();
    assert_eq!(first.fetched, 6);
    assert_eq!(cold.calls().len(), 6);

    // fresh process, same cache file
    let warm = ScriptedDiscoveryProvider::new()
        .with_week("2025-06-09", vec![obs("2", "Beta", "2025-06-10 00:00:00")]);
    let mut store = DiscoveryStore::load(&path).unwrap();
    let second = reconcile(&mut store, &warm, start, end, &opts).await.unwrap();

    assert_eq!(warm.calls(), vec!["2025-06-02", "2025-06-09"]);
    assert_eq!(second.invalidated, 2);
    assert_eq!(second.already_fetched, 4);
    assert_eq!(second.entities.len(), 2);
    assert_eq!(second.entities["1"].name, "Alpha");
}

#[tokio::test]
async fn empty_range_fetches_nothing_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let snapshot = r#"{"meta":{"version":1},"intervals":{"2025-06-09":{"fetched_at":"2025-06-10T00:00:00Z"}},"entities":{"1":{"name":"Alpha","firstDiscoveryDate":"2025-06-10 00:00:00"}}}"#;
    std::fs::write(&path, snapshot).unwrap();

    let provider = ScriptedDiscoveryProvider::new();
    let at = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap();
    let mut store = DiscoveryStore::load(&path).unwrap();
    let report = reconcile(
        &mut store,
        &provider,
        at,
        at,
        &ReconcileOptions {
            safety_weeks: 2,
            delay: DelayPolicy::none(),
        },
    )
    .await
    .unwrap();

    assert!(provider.calls().is_empty());
    assert_eq!(report.planned, 0);
    assert_eq!(report.invalidated, 0);
    assert!(store.document().intervals.contains_key("2025-06-09"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), snapshot);
}
