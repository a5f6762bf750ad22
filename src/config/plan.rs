//! Test plan files
//!
//! A plan names the cluster under test and the checks to run against it.
//!
//! ```yaml
//! version: "1.0"
//! target:
//!   name: dev-cluster
//!   variables:
//!     ZK_HOST: zk.dev.local
//! checks:
//!   - id: zk-connect
//!     module: zookeeper
//!     name: Zookeeper connectivity
//!     kind: tcp
//!     host: ${ZK_HOST}
//!     port: 2181
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::file::is_yaml_file;
use crate::checks::{CheckKind, ClusterTarget};
use crate::models::{RuntimeTest, TestUnit};

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Plan validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Unsupported plan version: {0}")]
    UnsupportedVersion(String),

    #[error("Check #{0} has an empty id")]
    EmptyId(usize),

    #[error("Duplicate check id: {0}")]
    DuplicateId(String),

    #[error("Check '{0}' has an empty module")]
    EmptyModule(String),

    #[error("Check '{0}' depends on itself")]
    SelfDependency(String),

    #[error("Check '{id}': {reason}")]
    InvalidSettings { id: String, reason: String },
}

/// One check entry of a plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub id: String,
    pub module: String,
    /// Display name; defaults to the id
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub config_init: bool,
    #[serde(flatten)]
    pub kind: CheckKind,
}

impl CheckSpec {
    pub fn unit(&self) -> TestUnit {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let mut unit = TestUnit::new(&self.module, &self.id, name)
            .with_dependencies(self.dependencies.iter().cloned());
        if self.config_init {
            unit = unit.config_init();
        }
        unit
    }

    pub fn build(&self) -> Arc<dyn RuntimeTest<ClusterTarget>> {
        self.kind.build(self.unit())
    }

    fn validate(&self) -> std::result::Result<(), PlanError> {
        if self.module.trim().is_empty() {
            return Err(PlanError::EmptyModule(self.id.clone()));
        }
        if self.dependencies.iter().any(|d| d == &self.id) {
            return Err(PlanError::SelfDependency(self.id.clone()));
        }

        let invalid = |reason: &str| PlanError::InvalidSettings {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        match &self.kind {
            CheckKind::Tcp { host, .. } if host.trim().is_empty() => {
                Err(invalid("tcp checks need a host"))
            }
            CheckKind::Http { url, .. } if url.trim().is_empty() => {
                Err(invalid("http checks need a url"))
            }
            CheckKind::Config { required, .. } if required.is_empty() => {
                Err(invalid("config checks need at least one required variable"))
            }
            _ => Ok(()),
        }
    }
}

/// A cluster plus the checks to run against it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    #[serde(default = "default_version")]
    pub version: String,
    pub target: ClusterTarget,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl TestPlan {
    /// Load and validate a plan; YAML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

        let plan: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML plan: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON plan: {}", path.display()))?
        };

        plan.validate()
            .with_context(|| format!("Invalid plan: {}", path.display()))?;
        Ok(plan)
    }

    /// Structural checks; dependencies on unknown ids are left to the run to report
    pub fn validate(&self) -> std::result::Result<(), PlanError> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(PlanError::UnsupportedVersion(self.version.clone()));
        }

        let mut seen = HashSet::new();
        for (index, check) in self.checks.iter().enumerate() {
            if check.id.trim().is_empty() {
                return Err(PlanError::EmptyId(index + 1));
            }
            if !seen.insert(check.id.as_str()) {
                return Err(PlanError::DuplicateId(check.id.clone()));
            }
            check.validate()?;
        }
        Ok(())
    }

    /// Dependencies naming no check in the plan
    pub fn unknown_dependencies(&self) -> Vec<(String, String)> {
        let ids: HashSet<&str> = self.checks.iter().map(|c| c.id.as_str()).collect();
        self.checks
            .iter()
            .flat_map(|check| {
                check
                    .dependencies
                    .iter()
                    .filter(|dep| !ids.contains(dep.as_str()))
                    .map(|dep| (check.id.clone(), dep.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn units(&self) -> Vec<TestUnit> {
        self.checks.iter().map(CheckSpec::unit).collect()
    }

    pub fn build_tests(&self) -> Vec<Arc<dyn RuntimeTest<ClusterTarget>>> {
        self.checks.iter().map(CheckSpec::build).collect()
    }
}
