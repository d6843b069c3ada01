//! "Earliest date wins" entity merger.
//!
//! Invariants:
//! - `first_seen_at` never moves later.
//! - Applying an observation twice equals applying it once.
//! - The resulting `first_seen_at` does not depend on observation order.
//! - The stored name is the one from the first observation ever merged;
//!   later observations never rename an entity.

use std::collections::BTreeMap;

use fdx_schemas::{EntityRecord, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    MovedEarlier,
    Unchanged,
}

/// Counts of merge outcomes over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeTally {
    pub inserted: usize,
    pub moved_earlier: usize,
    pub unchanged: usize,
}

impl MergeTally {
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::MovedEarlier => self.moved_earlier += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn add(&mut self, other: MergeTally) {
        self.inserted += other.inserted;
        self.moved_earlier += other.moved_earlier;
        self.unchanged += other.unchanged;
    }
}

/// Apply one observation. Dates are compared as canonical timestamp
/// strings, which order chronologically for the fixed-width upstream format.
pub fn merge(entities: &mut BTreeMap<String, EntityRecord>, obs: &Observation) -> MergeOutcome {
    match entities.get_mut(&obs.entity_id) {
        None => {
            entities.insert(
                obs.entity_id.clone(),
                EntityRecord {
                    name: obs.name.clone(),
                    first_seen_at: obs.date.clone(),
                },
            );
            MergeOutcome::Inserted
        }
        Some(existing) if obs.date < existing.first_seen_at => {
            existing.first_seen_at = obs.date.clone();
            MergeOutcome::MovedEarlier
        }
        Some(_) => MergeOutcome::Unchanged,
    }
}

pub fn merge_all<'a>(
    entities: &mut BTreeMap<String, EntityRecord>,
    observations: impl IntoIterator<Item = &'a Observation>,
) -> MergeTally {
    let mut tally = MergeTally::default();
    for obs in observations {
        tally.record(merge(entities, obs));
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: &str, name: &str, date: &str) -> Observation {
        Observation::new(id, name, date)
    }

    #[test]
    fn new_id_is_inserted() {
        let mut m = BTreeMap::new();
        assert_eq!(merge(&mut m, &obs("10", "Sol", "2025-01-10")), MergeOutcome::Inserted);
        assert_eq!(m["10"].name, "Sol");
        assert_eq!(m["10"].first_seen_at, "2025-01-10");
    }

    #[test]
    fn merging_twice_equals_merging_once() {
        let o = obs("10", "Sol", "2025-01-10");
        let mut once = BTreeMap::new();
        merge(&mut once, &o);

        let mut twice = BTreeMap::new();
        merge(&mut twice, &o);
        assert_eq!(merge(&mut twice, &o), MergeOutcome::Unchanged);

        assert_eq!(once, twice);
    }

    #[test]
    fn earliest_date_wins_in_either_order() {
        let late = obs("10", "Sol", "2025-01-10");
        let early = obs("10", "Sol Prime", "2025-01-05");

        let mut forward = BTreeMap::new();
        merge(&mut forward, &late);
        assert_eq!(merge(&mut forward, &early), MergeOutcome::MovedEarlier);

        let mut reverse = BTreeMap::new();
        merge(&mut reverse, &early);
        assert_eq!(merge(&mut reverse, &late), MergeOutcome::Unchanged);

        assert_eq!(forward["10"].first_seen_at, "2025-01-05");
        assert_eq!(reverse["10"].first_seen_at, "2025-01-05");
    }

    #[test]
    fn first_writer_name_is_kept() {
        let mut m = BTreeMap::new();
        merge(&mut m, &obs("10", "Sol", "2025-01-10"));
        merge(&mut m, &obs("10", "Renamed", "2025-01-01"));
        assert_eq!(m["10"].name, "Sol");
        assert_eq!(m["10"].first_seen_at, "2025-01-01");
    }

    #[test]
    fn later_date_never_moves_record() {
        let mut m = BTreeMap::new();
        merge(&mut m, &obs("10", "Sol", "2025-01-05 08:00:00"));
        assert_eq!(
            merge(&mut m, &obs("10", "Sol", "2025-01-05 09:00:00")),
            MergeOutcome::Unchanged
        );
        assert_eq!(m["10"].first_seen_at, "2025-01-05 08:00:00");
    }

    #[test]
    fn tally_counts_batch() {
        let batch = [
            obs("1", "A", "2025-02-01"),
            obs("2", "B", "2025-02-01"),
            obs("1", "A", "2025-01-01"),
            obs("2", "B", "2025-03-01"),
        ];
        let mut m = BTreeMap::new();
        let t = merge_all(&mut m, &batch);
        assert_eq!(
            t,
            MergeTally {
                inserted: 2,
                moved_earlier: 1,
                unchanged: 1
            }
        );
    }
}
