//! Per-unit result model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ResultSummary, Severity, TestStatus, TestUnit};

/// Result slot for one submitted unit.
///
/// Every unit has one from the start of a run; `done` flips once the unit
/// has finished executing and `summary` carries its findings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub unit: TestUnit,
    pub done: bool,
    pub summary: ResultSummary,
    pub time_taken_ms: u64,
}

impl TestResult {
    /// Placeholder for a unit that has not finished yet
    pub fn pending(unit: TestUnit) -> Self {
        Self {
            unit,
            done: false,
            summary: ResultSummary::default(),
            time_taken_ms: 0,
        }
    }

    pub fn completed(unit: TestUnit, summary: ResultSummary, time_taken_ms: u64) -> Self {
        Self {
            unit,
            done: true,
            summary,
            time_taken_ms,
        }
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.summary.max_severity()
    }

    /// A finished unit that reported nothing counts as failed
    pub fn status(&self) -> TestStatus {
        match (self.done, self.max_severity()) {
            (false, _) => TestStatus::Pending,
            (true, None) => TestStatus::Fail,
            (true, Some(severity)) => TestStatus::from_severity(Some(severity)),
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        write!(f, "{} {} - {}", status.symbol(), self.unit.name, status)?;
        if let Some(overall) = &self.summary.overall {
            write!(f, ": {}", overall.message)?;
        }
        if self.done {
            write!(f, " ({}ms)", self.time_taken_ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultEntry;

    #[test]
    fn test_pending_result() {
        let result = TestResult::pending(TestUnit::new("m", "a", "A"));
        assert!(!result.done);
        assert_eq!(result.status(), TestStatus::Pending);
        assert_eq!(result.to_string(), "… A - PENDING");
    }

    #[test]
    fn test_completed_result() {
        let result = TestResult::completed(
            TestUnit::new("m", "a", "A"),
            ResultEntry::fatal("Broken", "it broke").into(),
            42,
        );
        assert_eq!(result.status(), TestStatus::Fail);
        assert_eq!(result.max_severity(), Some(Severity::Fatal));
        assert_eq!(result.to_string(), "✗ A - FAIL: it broke (42ms)");
    }

    #[test]
    fn test_completed_without_entries_is_not_pending() {
        let result = TestResult::completed(
            TestUnit::new("m", "a", "A"),
            Vec::<ResultEntry>::new().into(),
            5,
        );
        assert_eq!(result.status(), TestStatus::Fail);
        assert_eq!(result.to_string(), "✗ A - FAIL (5ms)");
    }
}
