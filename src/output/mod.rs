//! Output generation from harvested data
//!
//! Read-only consumers of the store: CSV export of a configured column
//! subset, and a statistics summary for the command line.

mod csv;
mod stats;

pub use csv::export_profiles;
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
