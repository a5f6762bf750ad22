//! Required configuration check

use async_trait::async_trait;

use super::ClusterTarget;
use crate::models::{ResultEntry, ResultSummary, RuntimeTest, Severity, TestUnit};

/// Reports every required variable that is unset or blank
pub struct RequiredVariablesCheck {
    unit: TestUnit,
    required: Vec<String>,
    failure_severity: Severity,
}

impl RequiredVariablesCheck {
    pub fn new(unit: TestUnit, required: Vec<String>) -> Self {
        Self {
            unit,
            required,
            failure_severity: Severity::Fatal,
        }
    }

    pub fn failure_severity(mut self, severity: Severity) -> Self {
        self.failure_severity = severity;
        self
    }
}

#[async_trait]
impl RuntimeTest<ClusterTarget> for RequiredVariablesCheck {
    fn unit(&self) -> &TestUnit {
        &self.unit
    }

    fn accepts(&self, target: &ClusterTarget) -> bool {
        !target.is_disabled(&self.unit.id)
    }

    async fn run_test(&self, target: &ClusterTarget) -> anyhow::Result<ResultSummary> {
        let missing: Vec<ResultEntry> = self
            .required
            .iter()
            .filter(|name| {
                target
                    .variable(name)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(|name| {
                ResultEntry::new(
                    self.failure_severity,
                    "Missing variable",
                    format!("{name} is not set for {}", target.name),
                )
            })
            .collect();

        if missing.is_empty() {
            return Ok(ResultEntry::info(
                "Configuration complete",
                format!("All {} required variables are set", self.required.len()),
            )
            .into());
        }

        let overall = ResultEntry::new(
            self.failure_severity,
            "Configuration incomplete",
            format!("{} of {} required variables are missing", missing.len(), self.required.len()),
        );
        Ok(ResultSummary::with_entries(overall, missing))
    }
}
