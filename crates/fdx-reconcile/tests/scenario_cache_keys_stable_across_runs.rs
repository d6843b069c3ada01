//! Cache keys must survive a change of start date within the same week,
//! otherwise every run would look like a cold start.

use chrono::{Duration, TimeZone, Utc};
use fdx_reconcile::{generate, plan, DelayPolicy};
use fdx_schemas::{IntervalRecord, StoreDocument};

#[test]
fn start_anywhere_in_week_reuses_previous_run_keys() {
    let end = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
    let first_start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(); // Wed

    // simulate a complete earlier run
    let mut doc = StoreDocument::default();
    for iv in generate(first_start, end) {
        doc.intervals.insert(
            iv.key(),
            IntervalRecord {
                fetched_at: end,
            },
        );
    }

    for offset_days in 0..=2 {
        // Wed, Tue, Mon of the same week
        let start = first_start - Duration::days(offset_days);
        let mut run_doc = doc.clone();
        let p = plan(&mut run_doc, start, end, 0, &DelayPolicy::default());
        assert!(
            p.candidates.is_empty(),
            "start {start} produced uncached candidates: {:?}",
            p.candidates
        );
    }

    // Sunday before belongs to the previous week: exactly one new interval.
    let sunday = first_start - Duration::days(3);
    let mut run_doc = doc.clone();
    let p = plan(&mut run_doc, sunday, end, 0, &DelayPolicy::default());
    assert_eq!(p.candidates.len(), 1);
    assert_eq!(p.candidates[0].key(), "2024-12-23");
}

#[test]
fn rerun_with_two_safety_weeks_refetches_exactly_two() {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap(); // Monday

    let mut doc = StoreDocument::default();
    let cold = plan(&mut doc, start, end, 2, &DelayPolicy::default());
    assert_eq!(cold.candidates.len(), 8);
    for iv in &cold.candidates {
        doc.intervals.insert(iv.key(), IntervalRecord { fetched_at: end });
    }

    let warm = plan(&mut doc, start, end, 2, &DelayPolicy::default());
    let keys: Vec<String> = warm.candidates.iter().map(|iv| iv.key()).collect();
    assert_eq!(keys, vec!["2025-02-17", "2025-02-24"]);
    assert_eq!(warm.already_fetched, 6);
}
