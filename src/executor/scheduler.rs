//! Dependency-ordered concurrent scheduler
//!
//! Runs a set of checks against one shared target. A check starts once every
//! check it depends on has finished, whatever their outcome. Each completion
//! publishes exactly one snapshot; when nothing is running and nothing else
//! can become ready, a final snapshot with `done = true` is published.
//!
//! Checks whose dependencies never finish (an unknown id, or a chain ending
//! in one) simply stay outstanding. That is not an error: the run still
//! terminates and the final snapshot lists them as outstanding.

use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::callback::ProgressCallback;
use super::pool::WorkerPool;
use crate::models::{
    ModuleResults, ResultEntry, ResultSummary, RuntimeTest, StatusSnapshot, TestResult,
};
use crate::utils::timer::Timer;

/// Scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Duplicate test id: {0}")]
    DuplicateId(String),

    #[error("Scheduler has already been run")]
    AlreadyStarted,
}

struct Node<T> {
    test: Arc<dyn RuntimeTest<T>>,
    /// Declared dependencies plus the run's config-init ids
    dependencies: BTreeSet<String>,
}

/// Mutable bookkeeping; every id is in exactly one of the three sets
#[derive(Default)]
struct RunState {
    outstanding: BTreeSet<String>,
    running: BTreeSet<String>,
    completed: BTreeSet<String>,
    results: HashMap<String, TestResult>,
    started: bool,
    final_snapshot: Option<StatusSnapshot>,
}

struct Shared<T> {
    nodes: HashMap<String, Node<T>>,
    /// Modules in order of first appearance, each with its ids in submission order
    modules: Vec<(String, Vec<String>)>,
    target: Arc<T>,
    callback: ProgressCallback,
    pool: Arc<dyn WorkerPool>,
    state: Mutex<RunState>,
    finished: watch::Sender<bool>,
}

/// Runs checks concurrently in dependency order.
///
/// ```ignore
/// let scheduler = Scheduler::new(tests, Arc::new(target), callback::channel(tx), Handle::current())?;
/// let last = scheduler.run().await?;
/// assert!(last.done);
/// ```
pub struct Scheduler<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Scheduler<T>
where
    T: Send + Sync + 'static,
{
    /// Build a scheduler over `tests`.
    ///
    /// Tests that do not accept the target are left out of the run. Every
    /// test not flagged `config_init` implicitly depends on all tests that
    /// are.
    pub fn new<I, P>(
        tests: I,
        target: Arc<T>,
        callback: ProgressCallback,
        pool: P,
    ) -> Result<Self, SchedulerError>
    where
        I: IntoIterator<Item = Arc<dyn RuntimeTest<T>>>,
        P: WorkerPool + 'static,
    {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for test in tests {
            let id = test.unit().id.clone();
            if !test.accepts(&target) {
                debug!("Test {} does not apply to this target", id);
                continue;
            }
            if !seen.insert(id.clone()) {
                return Err(SchedulerError::DuplicateId(id));
            }
            accepted.push(test);
        }

        let init_ids: BTreeSet<String> = accepted
            .iter()
            .filter(|t| t.unit().config_init)
            .map(|t| t.unit().id.clone())
            .collect();

        let mut nodes = HashMap::with_capacity(accepted.len());
        let mut modules: Vec<(String, Vec<String>)> = Vec::new();
        let mut state = RunState::default();

        for test in accepted {
            let unit = test.unit().clone();
            let id = unit.id.clone();

            let mut dependencies = unit.dependencies.clone();
            if !unit.config_init {
                dependencies.extend(init_ids.iter().cloned());
            }

            match modules.iter_mut().find(|(module, _)| *module == unit.module) {
                Some((_, ids)) => ids.push(id.clone()),
                None => modules.push((unit.module.clone(), vec![id.clone()])),
            }

            state.outstanding.insert(id.clone());
            state.results.insert(id.clone(), TestResult::pending(unit));
            nodes.insert(id, Node { test, dependencies });
        }

        let (finished, _) = watch::channel(false);

        Ok(Self {
            shared: Arc::new(Shared {
                nodes,
                modules,
                target,
                callback,
                pool: Arc::new(pool),
                state: Mutex::new(state),
                finished,
            }),
        })
    }

    /// Number of tests taking part in the run
    pub fn len(&self) -> usize {
        self.shared.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.nodes.is_empty()
    }

    /// Build a snapshot of the current state without publishing it
    pub fn snapshot(&self) -> StatusSnapshot {
        let state = self.shared.lock();
        let done = state.final_snapshot.is_some();
        self.shared.build_snapshot(&state, done)
    }

    /// Dispatch every ready test and wait for quiescence.
    ///
    /// Publishes an initial snapshot after the first dispatch, one per
    /// completion, and a final `done` snapshot, which is also returned.
    pub async fn run(&self) -> Result<StatusSnapshot, SchedulerError> {
        let mut finished = self.shared.finished.subscribe();

        let ready = {
            let mut state = self.shared.lock();
            if state.started {
                return Err(SchedulerError::AlreadyStarted);
            }
            state.started = true;

            info!(
                "Starting run of {} tests across {} modules",
                self.shared.nodes.len(),
                self.shared.modules.len()
            );

            let ready = self.shared.take_ready(&mut state);
            let snapshot = self.shared.build_snapshot(&state, false);
            self.shared.publish(snapshot);

            if state.running.is_empty() {
                self.shared.finish(&mut state);
            }
            ready
        };

        Shared::dispatch(&self.shared, ready);

        loop {
            let is_finished = *finished.borrow_and_update();
            if is_finished || finished.changed().await.is_err() {
                break;
            }
        }

        // The watch only reports finished after `finish` stored the final snapshot
        let state = self.shared.lock();
        Ok(state
            .final_snapshot
            .clone()
            .unwrap_or_else(|| self.shared.build_snapshot(&state, true)))
    }
}

impl<T> Shared<T>
where
    T: Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, RunState> {
        // A panicking callback must not wedge the run
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move every outstanding test whose dependencies have all completed to running
    fn take_ready(&self, state: &mut RunState) -> Vec<String> {
        let ready: Vec<String> = state
            .outstanding
            .iter()
            .filter(|id| {
                self.nodes
                    .get(*id)
                    .map_or(false, |node| node.dependencies.is_subset(&state.completed))
            })
            .cloned()
            .collect();

        for id in &ready {
            state.outstanding.remove(id);
            state.running.insert(id.clone());
        }
        ready
    }

    fn build_snapshot(&self, state: &RunState, done: bool) -> StatusSnapshot {
        let module_results = self
            .modules
            .iter()
            .map(|(module, ids)| {
                let mut outstanding = Vec::new();
                let mut running = Vec::new();
                let mut results = Vec::with_capacity(ids.len());

                for id in ids {
                    let Some(result) = state.results.get(id) else {
                        continue;
                    };
                    if state.running.contains(id) {
                        running.push(result.unit.clone());
                    } else if state.outstanding.contains(id) {
                        outstanding.push(result.unit.clone());
                    }
                    results.push(result.clone());
                }

                ModuleResults {
                    module: module.clone(),
                    outstanding,
                    running,
                    results,
                }
            })
            .collect();

        StatusSnapshot {
            module_results,
            tests_done: state.completed.len(),
            tests_running: state.running.len(),
            tests_outstanding: state.outstanding.len(),
            done,
        }
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        let callback = &self.callback;
        if panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
            warn!("Progress callback panicked; continuing run");
        }
    }

    /// Publish the final snapshot and wake `run`; only the first call has any effect
    fn finish(&self, state: &mut RunState) {
        if state.final_snapshot.is_some() {
            return;
        }

        if !state.outstanding.is_empty() {
            warn!(
                "{} tests can never run, their dependencies did not complete: {:?}",
                state.outstanding.len(),
                state.outstanding
            );
        }
        info!(
            "Run finished: {} completed, {} never started",
            state.completed.len(),
            state.outstanding.len()
        );

        let snapshot = self.build_snapshot(state, true);
        state.final_snapshot = Some(snapshot.clone());
        self.publish(snapshot);
        self.finished.send_replace(true);
    }

    /// Record one completion, start whatever it unblocked and publish a snapshot
    fn complete(&self, id: String, result: TestResult) -> Vec<String> {
        let mut state = self.lock();

        state.running.remove(&id);
        state.completed.insert(id.clone());
        state.results.insert(id, result);

        let ready = self.take_ready(&mut state);
        let snapshot = self.build_snapshot(&state, false);
        self.publish(snapshot);

        if state.running.is_empty() {
            self.finish(&mut state);
        }
        ready
    }

    fn dispatch(this: &Arc<Self>, ready: Vec<String>) {
        for id in ready {
            debug!("Dispatching {}", id);
            let shared = Arc::clone(this);
            this.pool.submit(async move { shared.execute(id).await }.boxed());
        }
    }

    async fn execute(self: Arc<Self>, id: String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let test = Arc::clone(&node.test);
        let unit = test.unit().clone();
        let timer = Timer::start(id.clone());

        let outcome = AssertUnwindSafe(test.run_test(&self.target))
            .catch_unwind()
            .await;

        let summary = match outcome {
            Ok(Ok(summary)) if summary.is_empty() => {
                warn!("Test {} returned no result", id);
                ResultSummary::single(ResultEntry::fatal(
                    format!("Error running {}", unit.name),
                    "Check returned no result",
                ))
            }
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!("Test {} failed with error: {:#}", id, e);
                ResultSummary::single(
                    ResultEntry::fatal(format!("Error running {}", unit.name), e.to_string())
                        .with_error(&e),
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Test {} panicked: {}", id, message);
                ResultSummary::single(
                    ResultEntry::fatal(format!("Error running {}", unit.name), message.clone())
                        .with_error_message(message),
                )
            }
        };

        let result = TestResult::completed(unit, summary, timer.stop());
        let ready = self.complete(id, result);
        Self::dispatch(&self, ready);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}
