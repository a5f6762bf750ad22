//! Output formatting module
//!
//! Display ordering and report formats for run results.

mod comparator;
mod formatter;

pub use comparator::DisplayComparator;
pub use formatter::{write_report_to_file, OutputFormat, ResultFormatter, RunReport, StatusCounts};
