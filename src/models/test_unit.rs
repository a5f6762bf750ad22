//! Test unit descriptors and the check contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::ResultSummary;

/// Identity of one schedulable check
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestUnit {
    pub module: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// Must finish before any non-init unit of the same run starts
    #[serde(default)]
    pub config_init: bool,
}

impl TestUnit {
    pub fn new(module: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            id: id.into(),
            name: name.into(),
            dependencies: BTreeSet::new(),
            config_init: false,
        }
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn config_init(mut self) -> Self {
        self.config_init = true;
        self
    }
}

impl fmt::Display for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.module, self.id, self.name)
    }
}

/// A diagnostic check that runs against a shared target of type `T`.
///
/// The target is shared by every check running concurrently; implementations
/// must treat it as read-only or synchronize internally.
#[async_trait]
pub trait RuntimeTest<T: ?Sized>: Send + Sync {
    fn unit(&self) -> &TestUnit;

    /// Whether this check applies to the given target at all
    fn accepts(&self, _target: &T) -> bool {
        true
    }

    async fn run_test(&self, target: &T) -> anyhow::Result<ResultSummary>;
}
