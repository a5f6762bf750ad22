//! Runtime tester facade
//!
//! Keeps a registry of checks and a worker pool, and starts a fresh
//! scheduler for every target it is asked to test.

use std::sync::Arc;
use tracing::info;

use super::callback::ProgressCallback;
use super::pool::WorkerPool;
use super::scheduler::{Scheduler, SchedulerError};
use crate::models::{RuntimeTest, StatusSnapshot};

/// Registry of checks for targets of type `T`
pub struct RuntimeTester<T> {
    tests: Vec<Arc<dyn RuntimeTest<T>>>,
    pool: Arc<dyn WorkerPool>,
}

impl<T> RuntimeTester<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(pool: Arc<dyn WorkerPool>) -> Self {
        Self {
            tests: Vec::new(),
            pool,
        }
    }

    /// Register a single check
    pub fn register(&mut self, test: Arc<dyn RuntimeTest<T>>) {
        self.tests.push(test);
    }

    pub fn with_tests<I>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn RuntimeTest<T>>>,
    {
        self.tests.extend(tests);
        self
    }

    pub fn tests(&self) -> &[Arc<dyn RuntimeTest<T>>] {
        &self.tests
    }

    /// Run every registered check that accepts `target`
    pub async fn run(
        &self,
        target: Arc<T>,
        callback: ProgressCallback,
    ) -> Result<StatusSnapshot, SchedulerError> {
        let scheduler = Scheduler::new(
            self.tests.iter().cloned(),
            target,
            callback,
            Arc::clone(&self.pool),
        )?;

        info!("Runtime test started with {} checks", scheduler.len());
        scheduler.run().await
    }
}
