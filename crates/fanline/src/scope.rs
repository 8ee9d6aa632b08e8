//! Task registry for one pipeline run.
//!
//! Every stage spawns its background task through a [`Scope`], which keeps
//! the join handle. [`Scope::quiesce`] then waits for all of them, giving the
//! orchestrator a deterministic point where no stage task is left running.

use crate::{CancelListener, PipelineStats};
use core::future::Future;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared context handed to every stage of a pipeline run.
///
/// Cloning is cheap; clones register tasks into the same registry.
#[derive(Clone, Debug)]
pub struct Scope {
    listener: CancelListener,
    stats: Arc<PipelineStats>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Scope {
    /// Creates a scope whose stages observe `listener` and record into
    /// `stats`.
    pub fn new(listener: CancelListener, stats: Arc<PipelineStats>) -> Self {
        Self {
            listener,
            stats,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The cancellation every stage of this scope races against.
    pub fn listener(&self) -> &CancelListener {
        &self.listener
    }

    /// The counters of this run.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub(crate) fn shared_stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Spawns a stage task on the current tokio runtime and registers it.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.tasks.lock().push(handle);
    }

    /// Number of registered tasks that have not been joined yet.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Waits until every task spawned through this scope has returned.
    ///
    /// Stages only return on end-of-stream or cancellation, so this is
    /// normally called after the signal fired. A task that panicked is
    /// logged and otherwise ignored; its streams are already closed because
    /// its ends were dropped during unwinding.
    pub async fn quiesce(&self) {
        loop {
            let handles = core::mem::take(&mut *self.tasks.lock());
            if handles.is_empty() {
                break;
            }

            for res in futures::future::join_all(handles).await {
                if let Err(_e) = res {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Stage task failed: {_e}");
                }
            }
        }
    }
}
