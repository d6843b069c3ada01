//! fdx-report
//!
//! Everything after discovery: traffic enrichment, ranked rows, CSV export
//! and summary statistics. Reads the discovery store, never writes it.

pub mod enrich;
pub mod rows;
pub mod stats;

pub use enrich::{enrich, EnrichHalt, EnrichOutcome};
pub use rows::{build_rows, write_csv, ReportRow, CSV_HEADERS};
pub use stats::{summarize, ReportStats, DEFAULT_TOP_N};
