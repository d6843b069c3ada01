//! Stable weekly interval generation.
//!
//! Every generated window starts on a Monday at 00:00:00 UTC, so two runs
//! whose start dates fall in the same calendar week produce identical
//! boundaries and therefore identical cache keys.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use fdx_schemas::Interval;

/// Normalise a timestamp to UTC. Naive values are taken to already be UTC;
/// zoned values are converted.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self)
    }
}

impl IntoUtc for NaiveDate {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.and_time(NaiveTime::default()))
    }
}

impl<Tz: TimeZone> IntoUtc for DateTime<Tz> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// Monday 00:00:00 UTC on or before `dt`. Saturates at the earliest
/// representable date.
pub fn align_to_monday(dt: impl IntoUtc) -> DateTime<Utc> {
    let date = dt.into_utc().date_naive();
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN)
        .into_utc()
}

/// Lazy, finite sequence of contiguous weekly windows.
///
/// Cloning restarts from the same position, so a generator can be walked
/// more than once.
#[derive(Debug, Clone)]
pub struct WeekIntervals {
    next_start: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
}

impl Iterator for WeekIntervals {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        let start = self.next_start?;
        if start >= self.end {
            self.next_start = None;
            return None;
        }
        let end = start.checked_add_signed(Duration::days(7))?;
        self.next_start = Some(end);
        Some(Interval { start, end })
    }
}

/// Weekly windows from the Monday on or before `start` until a window would
/// begin at or after `end`. The last window may extend past `end`; callers
/// filter by overlap rather than truncating.
pub fn generate(start: impl IntoUtc, end: impl IntoUtc) -> WeekIntervals {
    WeekIntervals {
        next_start: Some(align_to_monday(start)),
        end: end.into_utc(),
    }
}
