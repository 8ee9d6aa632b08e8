//! # Telemetry Features
//!
//! Pipelines report to an optional observability sink. Its absence never
//! changes what a run returns.
//!
//! ## Feature matrix
//!
//! - `tracing`: spans per stage task (`generator`, `filter` inside
//!   `worker{id}`, `merge_source{id}`, `take{limit}`) and lifecycle events.
//!   Run completion is logged at `info` with duration, worker count and
//!   result count.
//! - `metrics`: OpenTelemetry instruments, registered by passing a
//!   [`Meter`](opentelemetry::metrics::Meter) to `install_meter`.
//!
//! ## Metrics behavior
//!
//! - Instruments are recorded once per run, after the run has quiesced, so
//!   stage tasks never touch them.
//! - Every recording function below compiles to a no-op when `metrics` is
//!   disabled, and does nothing until a meter has been installed.
//!
//! ## Example usage
//!
//! ```ignore
//! let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder().build();
//! fanline::telemetry::install_meter(provider.meter("fanline"));
//! ```

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(feature = "metrics")]
static RUNS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RUN_ERRORS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RUN_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RESULTS_PER_RUN: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static VALUES_GENERATED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static VALUES_ACCEPTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static VALUES_REJECTED: OnceLock<Counter<u64>> = OnceLock::new();

/// Registers the pipeline instruments on `meter`.
///
/// Only the first call has an effect; instruments live for the rest of the
/// process.
#[cfg(feature = "metrics")]
pub fn install_meter(meter: Meter) {
    let _ = RUNS.set(
        meter
            .u64_counter("runs")
            .with_description("Pipeline runs started")
            .build(),
    );

    let _ = RUN_ERRORS.set(
        meter
            .u64_counter("run_errors")
            .with_description("Runs aborted by a producer or predicate failure")
            .build(),
    );

    let _ = RUN_DURATION_MS.set(
        meter
            .f64_histogram("run_duration")
            .with_unit("ms")
            .with_description("End-to-end run duration, including quiescence")
            .build(),
    );

    let _ = RESULTS_PER_RUN.set(
        meter
            .f64_histogram("results_per_run")
            .with_description("Values returned per successful run")
            .build(),
    );

    let _ = VALUES_GENERATED.set(
        meter
            .u64_counter("values_generated")
            .with_description("Values handed off by generators")
            .build(),
    );

    let _ = VALUES_ACCEPTED.set(
        meter
            .u64_counter("values_accepted")
            .with_description("Values that satisfied the predicate")
            .build(),
    );

    let _ = VALUES_REJECTED.set(
        meter
            .u64_counter("values_rejected")
            .with_description("Values discarded by the predicate")
            .build(),
    );
}

#[cfg(feature = "metrics")]
pub fn increment_runs() {
    if let Some(counter) = RUNS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_runs() {}

#[cfg(feature = "metrics")]
pub fn increment_run_errors() {
    if let Some(counter) = RUN_ERRORS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_run_errors() {}

#[cfg(feature = "metrics")]
pub fn record_run_duration(duration_ms: f64) {
    if let Some(histogram) = RUN_DURATION_MS.get() {
        histogram.record(duration_ms, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_run_duration(_duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn record_results_per_run(count: f64) {
    if let Some(histogram) = RESULTS_PER_RUN.get() {
        histogram.record(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_results_per_run(_count: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_values_generated(count: u64) {
    if let Some(counter) = VALUES_GENERATED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_values_generated(_count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_values_accepted(count: u64) {
    if let Some(counter) = VALUES_ACCEPTED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_values_accepted(_count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_values_rejected(count: u64) {
    if let Some(counter) = VALUES_REJECTED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_values_rejected(_count: u64) {}
