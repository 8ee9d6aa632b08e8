use portable_atomic::{AtomicU64, Ordering};

/// Throughput counters shared by every stage of one pipeline run.
///
/// Counters only ever increase. Once the run has quiesced,
/// `received == accepted + rejected` holds exactly: every value a worker takes
/// off its input is evaluated and counted exactly once.
#[derive(Debug, Default)]
pub struct PipelineStats {
    generated: AtomicU64,
    received: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    merged: AtomicU64,
    taken: AtomicU64,
}

/// A point-in-time copy of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Values the generator placed into its output slot. A value still
    /// parked in the slot when the run stops is counted here but never
    /// `received`, so `generated >= received`.
    pub generated: u64,
    /// Values taken off the generator stream by workers.
    pub received: u64,
    /// Values that satisfied the predicate.
    pub accepted: u64,
    /// Values that failed the predicate (or whose evaluation failed).
    pub rejected: u64,
    /// Values forwarded by the fan-in merger.
    pub merged: u64,
    /// Values forwarded by the bounded take.
    pub taken: u64,
}

impl PipelineStats {
    pub(crate) fn record_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_verdict(&self, accepted: bool) {
        if accepted {
            self.accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_merged(&self) {
        self.merged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_taken(&self) {
        self.taken.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of values the bounded take has forwarded so far.
    pub fn taken(&self) -> u64 {
        self.taken.load(Ordering::Relaxed)
    }

    /// Copies every counter.
    ///
    /// While stages are still running the copy is not atomic across counters;
    /// take it after the run has returned for exact relations.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            merged: self.merged.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Returns `true` if every received value was either accepted or rejected.
    pub fn is_conserved(&self) -> bool {
        self.received == self.accepted + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_records() {
        let stats = PipelineStats::default();
        stats.record_generated();
        stats.record_generated();
        stats.record_received();
        stats.record_received();
        stats.record_verdict(true);
        stats.record_verdict(false);
        stats.record_merged();
        stats.record_taken();

        let snap = stats.snapshot();
        assert_eq!(
            snap,
            StatsSnapshot {
                generated: 2,
                received: 2,
                accepted: 1,
                rejected: 1,
                merged: 1,
                taken: 1,
            }
        );
        assert!(snap.is_conserved());
        assert_eq!(stats.taken(), 1);
    }

    #[test]
    fn detects_unbalanced_counts() {
        let snap = StatsSnapshot {
            received: 3,
            accepted: 1,
            rejected: 1,
            ..StatsSnapshot::default()
        };
        assert!(!snap.is_conserved());
    }
}
