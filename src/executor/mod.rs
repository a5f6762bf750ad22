//! Test execution engine
//!
//! Dependency-ordered scheduling of checks on a worker pool.

pub mod callback;
mod pool;
mod scheduler;
mod tester;

pub use callback::ProgressCallback;
pub use pool::{BoundedPool, Job, WorkerPool};
pub use scheduler::{Scheduler, SchedulerError};
pub use tester::RuntimeTester;
