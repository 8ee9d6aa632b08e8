use super::state::{PipelineState, StateCell};
use crate::{CancelSignal, PipelineStats, StatsSnapshot};
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// External control over a [`crate::Pipeline`].
///
/// Obtained through [`crate::Pipeline::handle`] before the run starts and
/// usable from any task or thread while it executes and after it returned.
#[derive(Clone, Debug)]
pub struct PipelineHandle {
    pub(crate) signal: CancelSignal,
    pub(crate) state: Arc<StateCell>,
    pub(crate) stats: Arc<PipelineStats>,
}

impl PipelineHandle {
    /// Aborts the run: fires the pipeline's cancellation signal.
    ///
    /// A run that has already started moves to
    /// [`PipelineState::Cancelling`] right away. A pipeline cancelled while
    /// still idle stays idle until it is run.
    ///
    /// Returns `true` if this call fired it. Cancelling a pipeline that
    /// already finished, or cancelling twice, is a no-op returning `false`.
    pub fn cancel(&self) -> bool {
        let fired = self.signal.fire();
        if self.state.get() != PipelineState::Idle {
            self.state.advance(PipelineState::Cancelling);
        }
        #[cfg(feature = "tracing")]
        if fired {
            tracing::debug!("Pipeline cancelled through handle");
        }
        fired
    }

    /// Returns `true` once the pipeline's signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_fired()
    }

    /// Current lifecycle state of the run.
    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// Current throughput counters of the run.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancels the pipeline once `after` has elapsed.
    ///
    /// Runs have no deadline of their own; this is the way to bound one. The
    /// timer task returns early, without firing, if the pipeline is cancelled
    /// by other means first.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn cancel_after(&self, after: Duration) -> JoinHandle<()> {
        let handle = self.clone();
        let listener = self.signal.listener();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = listener.cancelled() => {}
                () = tokio::time::sleep(after) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Pipeline deadline of {after:?} elapsed");
                    handle.cancel();
                }
            }
        })
    }
}
