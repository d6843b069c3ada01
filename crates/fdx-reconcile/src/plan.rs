//! Reconciliation planning: safety-window invalidation, candidate selection
//! and delay choice. No IO; the engine executes the resulting plan.

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use fdx_schemas::{Interval, StoreDocument};

use crate::interval::{align_to_monday, generate, IntoUtc};

/// Inter-request delay chosen from the size of the backlog.
///
/// A large backlog gets the long delay for every request so a cold-start
/// backfill does not trip upstream rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    /// Candidate counts strictly above this use `long`.
    pub threshold: usize,
    pub short: Duration,
    pub long: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            threshold: 360,
            short: Duration::from_millis(400),
            long: Duration::from_secs(10),
        }
    }
}

impl DelayPolicy {
    /// No waiting at all; for tests and scripted providers.
    pub fn none() -> Self {
        Self {
            threshold: usize::MAX,
            short: Duration::ZERO,
            long: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, candidate_count: usize) -> Duration {
        if candidate_count > self.threshold {
            self.long
        } else {
            self.short
        }
    }
}

/// What one reconciliation run will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Keys removed from the interval map by the safety window.
    pub invalidated: Vec<String>,
    /// Intervals to fetch, ascending.
    pub candidates: Vec<Interval>,
    /// In-range intervals skipped because they are already fetched.
    pub already_fetched: usize,
    pub delay: Duration,
    /// The backlog is over the policy threshold, so `delay` is the long one.
    pub long_delay: bool,
}

impl ReconcilePlan {
    pub fn empty() -> Self {
        Self {
            invalidated: Vec::new(),
            candidates: Vec::new(),
            already_fetched: 0,
            delay: Duration::ZERO,
            long_delay: false,
        }
    }
}

/// Monday-aligned start of the trailing safety window ending at `end`.
///
/// A window reaching past the earliest representable instant saturates
/// there, which reopens every recorded interval before `end`.
pub fn safety_window_start(end: DateTime<Utc>, safety_weeks: u32) -> DateTime<Utc> {
    ChronoDuration::try_weeks(i64::from(safety_weeks))
        .and_then(|span| end.checked_sub_signed(span))
        .map(align_to_monday)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Start instant of a recorded interval key; `None` for keys that are not
/// `YYYY-MM-DD`.
fn recorded_start(key: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok().map(IntoUtc::into_utc)
}

/// Invalidate the safety window in `doc`, then select every interval that
/// overlaps `[start, end)` and is not recorded as fetched.
///
/// An empty or inverted range plans nothing and leaves `doc` untouched.
pub fn plan(
    doc: &mut StoreDocument,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    safety_weeks: u32,
    policy: &DelayPolicy,
) -> ReconcilePlan {
    if start >= end {
        return ReconcilePlan::empty();
    }

    // Walk recorded keys rather than generating the window, so the cost is
    // bounded by the store size whatever `safety_weeks` is.
    let mut invalidated = Vec::new();
    if safety_weeks > 0 {
        let window_start = safety_window_start(end, safety_weeks);
        invalidated = doc
            .intervals
            .keys()
            .filter(|key| recorded_start(key).is_some_and(|s| s >= window_start && s < end))
            .cloned()
            .collect();
        for key in &invalidated {
            doc.intervals.remove(key);
        }
    }

    let mut candidates = Vec::new();
    let mut already_fetched = 0;
    for iv in generate(start, end).filter(|iv| iv.overlaps(start, end)) {
        if doc.is_fetched(&iv) {
            already_fetched += 1;
        } else {
            candidates.push(iv);
        }
    }

    let delay = policy.delay_for(candidates.len());
    let long_delay = candidates.len() > policy.threshold;
    ReconcilePlan {
        invalidated,
        candidates,
        already_fetched,
        delay,
        long_delay,
    }
}
