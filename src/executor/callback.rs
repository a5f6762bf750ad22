//! Progress observers

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::StatusSnapshot;

/// Receives every snapshot of a run, one call at a time.
///
/// Calls are made while the scheduler holds its state lock, so a callback
/// must not block on the run it is observing.
pub type ProgressCallback = Arc<dyn Fn(StatusSnapshot) + Send + Sync>;

pub fn callback<F>(f: F) -> ProgressCallback
where
    F: Fn(StatusSnapshot) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Forward snapshots into a channel; once the receiver is gone they are dropped
pub fn channel(sender: UnboundedSender<StatusSnapshot>) -> ProgressCallback {
    Arc::new(move |snapshot| {
        let _ = sender.send(snapshot);
    })
}

pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}
