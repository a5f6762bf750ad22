//! Worker pools that execute dispatched checks

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

/// A unit of work handed to a pool
pub type Job = BoxFuture<'static, ()>;

/// Something that can run jobs concurrently.
///
/// `submit` must not drive the job to completion inline: the scheduler
/// submits from completion handlers and expects to return promptly.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, job: Job);
}

/// One tokio task per job, no cap
impl WorkerPool for Handle {
    fn submit(&self, job: Job) {
        self.spawn(job);
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, job: Job) {
        (**self).submit(job)
    }
}

/// Tokio pool that runs at most `max_concurrent` jobs at once
#[derive(Clone, Debug)]
pub struct BoundedPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BoundedPool {
    pub fn new(handle: Handle, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Pool on the runtime of the calling task
    pub fn current(max_concurrent: usize) -> Self {
        Self::new(Handle::current(), max_concurrent)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl WorkerPool for BoundedPool {
    fn submit(&self, job: Job) {
        let permits = self.permits.clone();
        self.handle.spawn(async move {
            // Never closed
            let _permit = permits.acquire_owned().await.ok();
            job.await;
        });
    }
}
