//! Progress snapshots published by the scheduler

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{TestResult, TestUnit};

/// Per-module view of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleResults {
    pub module: String,
    pub outstanding: Vec<TestUnit>,
    pub running: Vec<TestUnit>,
    /// One entry per unit of the module, whatever its state
    pub results: Vec<TestResult>,
}

impl ModuleResults {
    /// Ids of units that have finished: results minus outstanding minus running
    pub fn completed_ids(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .map(|r| &r.unit.id)
            .filter(|id| {
                !self.outstanding.iter().any(|u| &u.id == *id)
                    && !self.running.iter().any(|u| &u.id == *id)
            })
            .cloned()
            .collect()
    }

    pub fn result(&self, id: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.unit.id == id)
    }
}

/// Immutable point-in-time state of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub module_results: Vec<ModuleResults>,
    pub tests_done: usize,
    pub tests_running: usize,
    pub tests_outstanding: usize,
    pub done: bool,
}

impl StatusSnapshot {
    pub fn total(&self) -> usize {
        self.tests_done + self.tests_running + self.tests_outstanding
    }

    /// Ids completed across every module
    pub fn completed_ids(&self) -> BTreeSet<String> {
        self.module_results
            .iter()
            .flat_map(|m| m.completed_ids())
            .collect()
    }

    pub fn running_ids(&self) -> BTreeSet<String> {
        self.module_results
            .iter()
            .flat_map(|m| m.running.iter().map(|u| u.id.clone()))
            .collect()
    }

    pub fn outstanding_ids(&self) -> BTreeSet<String> {
        self.module_results
            .iter()
            .flat_map(|m| m.outstanding.iter().map(|u| u.id.clone()))
            .collect()
    }

    pub fn result(&self, id: &str) -> Option<&TestResult> {
        self.module_results.iter().find_map(|m| m.result(id))
    }

    pub fn results(&self) -> impl Iterator<Item = &TestResult> {
        self.module_results.iter().flat_map(|m| m.results.iter())
    }

    pub fn progress_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            100.0
        } else {
            (self.tests_done as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} done, {} running, {} outstanding{}",
            self.tests_done,
            self.total(),
            self.tests_running,
            self.tests_outstanding,
            if self.done { " [finished]" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultEntry;

    fn module() -> ModuleResults {
        let a = TestUnit::new("m", "a", "A");
        let b = TestUnit::new("m", "b", "B");
        let c = TestUnit::new("m", "c", "C");
        ModuleResults {
            module: "m".to_string(),
            outstanding: vec![c.clone()],
            running: vec![b.clone()],
            results: vec![
                TestResult::completed(a, ResultEntry::info("ok", "ok").into(), 1),
                TestResult::pending(b),
                TestResult::pending(c),
            ],
        }
    }

    #[test]
    fn test_module_completed_ids() {
        let ids = module().completed_ids();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a".to_string()]);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = StatusSnapshot {
            module_results: vec![module()],
            tests_done: 1,
            tests_running: 1,
            tests_outstanding: 1,
            done: false,
        };
        assert_eq!(snapshot.to_string(), "1/3 done, 1 running, 1 outstanding");
        assert_eq!(snapshot.running_ids().len(), 1);
        assert!(snapshot.result("c").is_some());
    }
}
