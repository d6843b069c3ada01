//! fdx-reconcile
//!
//! Incremental time-windowed cache reconciliation.
//!
//! - `interval`: stable Monday-aligned weekly windows
//! - `merge`: "earliest date wins" entity merger
//! - `plan`: safety-window invalidation + candidate selection (no IO)
//! - `engine`: sequential fetch / merge / persist loop
//!
//! The upstream is reached only through `fdx_edsm::DiscoveryProvider`, so
//! every path here can run against a scripted provider.

pub mod engine;
pub mod interval;
pub mod merge;
pub mod plan;

pub use engine::{execute, reconcile, FailedInterval, ReconcileOptions, ReconcileReport};
pub use interval::{align_to_monday, generate, IntoUtc, WeekIntervals};
pub use merge::{merge, merge_all, MergeOutcome, MergeTally};
pub use plan::{plan, safety_window_start, DelayPolicy, ReconcilePlan};
