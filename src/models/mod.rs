//! Data models for runtime testing
//!
//! Units, results and the snapshots built from them.

mod result;
mod status;
mod test_result;
mod test_unit;

pub use result::{ResultEntry, ResultSummary, Severity, TestStatus};
pub use status::{ModuleResults, StatusSnapshot};
pub use test_result::TestResult;
pub use test_unit::{RuntimeTest, TestUnit};
