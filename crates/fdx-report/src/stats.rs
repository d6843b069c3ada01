//! Summary statistics over report rows.

use std::fmt;

use crate::ReportRow;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportStats {
    pub total: usize,
    pub never_revisited: usize,
    pub revisited: usize,
    /// Share of systems nobody returned to, in percent, two decimals.
    pub intact_pct: f64,
    pub top: Vec<ReportRow>,
}

/// `rows` is expected in report order (see `build_rows`); `top` takes the
/// first `top_n` of them.
pub fn summarize(rows: &[ReportRow], top_n: usize) -> ReportStats {
    let total = rows.len();
    let never_revisited = rows.iter().filter(|r| !r.visited_after_discovery).count();
    let revisited = total - never_revisited;

    let intact_pct = if total == 0 {
        0.0
    } else {
        let raw = never_revisited as f64 * 100.0 / total as f64;
        (raw * 100.0).round() / 100.0
    };

    ReportStats {
        total,
        never_revisited,
        revisited,
        intact_pct,
        top: rows.iter().take(top_n).cloned().collect(),
    }
}

impl fmt::Display for ReportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "first discoveries:    {}", self.total)?;
        writeln!(f, "never revisited:      {}", self.never_revisited)?;
        writeln!(f, "revisited:            {}", self.revisited)?;
        writeln!(f, "intact:               {:.2}%", self.intact_pct)?;
        if !self.top.is_empty() {
            writeln!(f, "top {} by traffic:", self.top.len())?;
            for (i, row) in self.top.iter().enumerate() {
                writeln!(
                    f,
                    "  {:>2}. {} ({}) total={} week={} day={}",
                    i + 1,
                    row.system_name,
                    row.system_id,
                    row.total_traffic,
                    row.traffic_week,
                    row.traffic_day
                )?;
            }
        }
        Ok(())
    }
}
