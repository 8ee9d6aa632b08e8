//! Pipeline orchestration.
//!
//! A [`Pipeline`] wires the stages into one graph:
//!
//! ```text
//! generate ─┬─ filter ─┐
//!           ├─ filter ─┼─ merge ── take(N) ── caller
//!           └─ filter ─┘
//! ```
//!
//! All `parallelism` filters compete for values of the single generator
//! stream. The orchestrator drains the bounded take, then fires the
//! cancellation signal exactly once and waits until every stage task has
//! returned before handing the result back.

mod config;
mod handle;
mod state;

pub use config::*;
pub use handle::*;
pub use state::PipelineState;

use crate::{
    CancelSignal, Error, FaultRx, PipelineStats, Result, Scope, fault_channel,
    stage::{merge, take, try_filter, try_generate},
    telemetry,
};
use core::convert::Infallible;
use futures::StreamExt;
use state::StateCell;
use std::{sync::Arc, time::Instant};

/// A single-use fan-out/fan-in pipeline.
///
/// The pipeline owns its cancellation signal. Use [`Pipeline::handle`] to
/// observe or abort a run from elsewhere.
///
/// # Example
///
/// ```
/// use fanline::{Pipeline, PipelineConfig, primes};
///
/// # fn main() -> fanline::Result<()> {
/// let pipeline = Pipeline::new(PipelineConfig::new(5).with_parallelism(2))?;
/// let found = pipeline.run_blocking(primes::random_candidates(primes::DEFAULT_UPPER_BOUND), |n| {
///     primes::is_prime(*n)
/// })?;
///
/// assert_eq!(found.len(), 5);
/// assert!(found.iter().all(|n| primes::is_prime(*n)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    signal: CancelSignal,
    state: Arc<StateCell>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Creates an idle pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails
    /// [`PipelineConfig::validate`].
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            signal: CancelSignal::new(),
            state: Arc::default(),
            stats: Arc::default(),
        })
    }

    /// The validated configuration of this pipeline.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a handle for cancelling and observing this pipeline.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            signal: self.signal.clone(),
            state: Arc::clone(&self.state),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Runs the pipeline to completion and returns the collected values.
    ///
    /// With an unbounded producer the result holds exactly `take` values,
    /// in merged-stream arrival order. It is shorter only if the pipeline was
    /// cancelled through its handle first.
    ///
    /// Dropping the returned future before it resolves cancels the pipeline,
    /// so no stage task outlives an aborted caller. The state then stays at
    /// [`PipelineState::Cancelling`], since nothing is left to await
    /// quiescence.
    ///
    /// # Panics
    ///
    /// Panics if polled outside of a tokio runtime.
    pub async fn run<T, P, F>(self, mut producer: P, predicate: F) -> Vec<T>
    where
        T: Send + 'static,
        P: FnMut() -> T + Send + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let res = self
            .drive::<T, Infallible, _, _>(
                move || Ok(producer()),
                move |value: &T| Ok(predicate(value)),
            )
            .await;

        match res {
            Ok(values) => values,
            Err(never) => match never {},
        }
    }

    /// Runs the pipeline with a fallible producer and predicate.
    ///
    /// The first failure reported by any stage cancels the pipeline early.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] with that first failure. Every stage task has
    /// returned by the time the error is handed back.
    ///
    /// # Panics
    ///
    /// Panics if polled outside of a tokio runtime.
    pub async fn try_run<T, E, P, F>(self, producer: P, predicate: F) -> Result<Vec<T>, Error<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnMut() -> core::result::Result<T, E> + Send + 'static,
        F: Fn(&T) -> core::result::Result<bool, E> + Send + Sync + 'static,
    {
        self.drive(producer, predicate).await.map_err(Error::Stage)
    }

    /// Runs the pipeline on a dedicated multi-threaded runtime and blocks the
    /// calling thread until it finishes.
    ///
    /// The runtime gets one worker thread per configured worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Runtime`] if the runtime cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous context.
    pub fn run_blocking<T, P, F>(self, producer: P, predicate: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        P: FnMut() -> T + Send + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.parallelism)
            .enable_time()
            .build()
            .map_err(Error::Runtime)?;

        Ok(runtime.block_on(self.run(producer, predicate)))
    }

    async fn drive<T, E, P, F>(self, producer: P, predicate: F) -> core::result::Result<Vec<T>, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: FnMut() -> core::result::Result<T, E> + Send + 'static,
        F: Fn(&T) -> core::result::Result<bool, E> + Send + Sync + 'static,
    {
        let start = Instant::now();
        // Cancels on every exit path, including the caller dropping this
        // future.
        let _abort = AbortOnDrop(self.handle());

        self.state.advance(PipelineState::Running);
        telemetry::increment_runs();

        let scope = Scope::new(self.signal.listener(), Arc::clone(&self.stats));
        let (faults, fault_rx) = fault_channel();

        let candidates = try_generate(&scope, faults.clone(), producer);
        let predicate = Arc::new(predicate);
        let workers: Vec<_> = (0..self.config.parallelism)
            .map(|_worker_id| {
                #[cfg(feature = "tracing")]
                let _span = tracing::debug_span!("worker", id = _worker_id).entered();

                let predicate = Arc::clone(&predicate);
                try_filter(&scope, faults.clone(), candidates.clone(), move |value: &T| {
                    predicate(value)
                })
            })
            .collect();
        // The stages hold the remaining ends. Keeping these would keep the
        // generator's consumers alive and the fault channel open.
        drop(candidates);
        drop(faults);

        let merged = merge(&scope, workers);
        let taken = take(&scope, merged, self.config.take);

        self.state.advance(PipelineState::Draining);
        let outcome = drain(taken.into_stream().collect::<Vec<T>>(), fault_rx).await;

        self.state.advance(PipelineState::Cancelling);
        self.signal.fire();
        scope.quiesce().await;
        self.state.advance(PipelineState::Terminated);

        let elapsed = start.elapsed();
        let stats = self.stats.snapshot();
        telemetry::record_run_duration(elapsed.as_secs_f64() * 1_000.0);
        telemetry::increment_values_generated(stats.generated);
        telemetry::increment_values_accepted(stats.accepted);
        telemetry::increment_values_rejected(stats.rejected);

        match &outcome {
            Ok(values) => {
                telemetry::record_results_per_run(values.len() as f64);
                #[cfg(feature = "tracing")]
                tracing::info!(
                    duration = ?elapsed,
                    workers = self.config.parallelism,
                    results = values.len(),
                    "Run finished"
                );
            }
            Err(_) => {
                telemetry::increment_run_errors();
                #[cfg(feature = "tracing")]
                tracing::warn!(duration = ?elapsed, "Run aborted by stage failure");
            }
        }

        outcome
    }
}

/// Cancels the run through its handle when dropped.
struct AbortOnDrop(PipelineHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Collects the take output unless a stage reports a failure first.
///
/// A fault that raced the end of the take output still wins: it closed a
/// stream and may have shortened the result.
async fn drain<T, E>(
    collect: impl Future<Output = Vec<T>>,
    mut fault_rx: FaultRx<E>,
) -> core::result::Result<Vec<T>, E> {
    tokio::pin!(collect);

    tokio::select! {
        biased;
        Some(err) = fault_rx.recv() => Err(err),
        values = &mut collect => match fault_rx.try_recv() {
            Some(err) => Err(err),
            None => Ok(values),
        },
    }
}
