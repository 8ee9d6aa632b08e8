//! Broadcast-once cancellation.
//!
//! A pipeline owns exactly one [`CancelSignal`]. Every stage task receives a
//! [`CancelListener`], which can observe the signal but never fire it. Both
//! sides wrap the same [`CancellationToken`], so waking observers does not
//! involve polling.

use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Owner side of the cancellation signal.
///
/// Cloning yields another owner of the same signal. Firing is idempotent:
/// only the first call to [`CancelSignal::fire`] transitions the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Creates a signal that has not fired yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal.
    ///
    /// Returns `true` if this call transitioned the signal, `false` if it had
    /// already fired. Firing again has no other observable effect.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Returns `true` once the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a read-only view of this signal for a stage task.
    pub fn listener(&self) -> CancelListener {
        CancelListener {
            token: self.token.clone(),
        }
    }
}

/// Read-only capability over a [`CancelSignal`].
#[derive(Clone, Debug)]
pub struct CancelListener {
    token: CancellationToken,
}

impl CancelListener {
    /// Returns `true` once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired. Resolves immediately if it already
    /// has.
    ///
    /// The returned future is cancel safe and meant to be raced against
    /// stream operations in `tokio::select!`.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn fire_transitions_exactly_once() {
        let signal = CancelSignal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(signal.is_fired());
        assert!(!signal.fire());
        assert!(!signal.clone().fire());
    }

    #[test]
    fn listeners_observe_fire() {
        let signal = CancelSignal::new();
        let listeners: Vec<_> = (0..8).map(|_| signal.listener()).collect();
        assert!(listeners.iter().all(|l| !l.is_cancelled()));

        signal.fire();
        assert!(listeners.iter().all(CancelListener::is_cancelled));
    }

    #[tokio::test]
    async fn cancelled_wakes_every_waiter() {
        let signal = CancelSignal::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let listener = signal.listener();
                tokio::spawn(async move { listener.cancelled().await })
            })
            .collect();

        tokio::task::yield_now().await;
        signal.fire();

        tokio::time::timeout(Duration::from_secs(5), futures::future::join_all(waiters))
            .await
            .expect("waiters were not woken")
            .into_iter()
            .for_each(|res| res.unwrap());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_after_fire() {
        let signal = CancelSignal::new();
        signal.fire();
        let listener = signal.listener();
        tokio::time::timeout(Duration::from_millis(100), listener.cancelled())
            .await
            .unwrap();
    }

    #[test]
    fn concurrent_fire_has_single_winner() {
        let signal = CancelSignal::new();
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let signal = signal.clone();
                    s.spawn(move || usize::from(signal.fire()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }
}
