//! Runtime Tester - dependency-ordered cluster diagnostics
//!
//! Runs a set of diagnostic checks against a target, starting each check
//! once the checks it depends on have finished, and reports progress as
//! immutable [`models::StatusSnapshot`]s.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use runtime_tester::checks::{ClusterTarget, ConnectivityCheck};
//! use runtime_tester::executor::{callback, BoundedPool, RuntimeTester};
//! use runtime_tester::models::{RuntimeTest, TestUnit};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let check = ConnectivityCheck::new(
//!     TestUnit::new("zookeeper", "zk-connect", "Zookeeper connectivity"),
//!     "${ZK_HOST}",
//!     "2181",
//! );
//! let tester = RuntimeTester::new(Arc::new(BoundedPool::current(4)))
//!     .with_tests([Arc::new(check) as Arc<dyn RuntimeTest<ClusterTarget>>]);
//!
//! let target = ClusterTarget::new("dev").with_variable("ZK_HOST", "zk.dev.local");
//! let last = tester.run(Arc::new(target), callback::no_progress()).await?;
//! assert!(last.done);
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod config;
pub mod executor;
pub mod http;
pub mod models;
pub mod output;
pub mod utils;
