//! Single-slot streams between pipeline stages.
//!
//! A stream is a bounded [`mpsc`] channel of capacity one, so at most one
//! value is in flight per handoff point. The producer end ([`Inlet`]) is
//! cloneable for many-to-one merging. The consumer end ([`Outlet`]) is also
//! cloneable: clones share one receiver behind an async mutex and compete for
//! values, so each value reaches exactly one consumer.
//!
//! A stream closes when its last [`Inlet`] is dropped. Consumers then observe
//! end-of-stream once the in-flight value, if any, has been taken.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Producer end of a stream.
#[derive(Debug)]
pub struct Inlet<T> {
    tx: mpsc::Sender<T>,
}

// Manual impl: `T` itself does not need to be `Clone`.
impl<T> Clone for Inlet<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Inlet<T> {
    /// Hands `value` to a consumer, waiting for the slot to free up.
    ///
    /// Returns the value back if every [`Outlet`] has been dropped. Cancel
    /// safe: if the future is dropped before completion the value is dropped
    /// and nothing is enqueued.
    pub async fn send(&self, value: T) -> Result<(), T> {
        self.tx.send(value).await.map_err(|err| err.0)
    }

    /// Returns `true` once every consumer is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end of a stream.
#[derive(Debug)]
pub struct Outlet<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Outlet<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Outlet<T> {
    /// Receives the next value, or `None` once the stream is closed and
    /// drained.
    ///
    /// Cancel safe: dropping the future before it resolves never loses a
    /// value.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Converts this outlet into a [`Stream`] of its values.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |outlet| async move {
            let value = outlet.recv().await?;
            Some((value, outlet))
        })
    }
}

/// Creates a connected stream with a single in-flight slot.
pub fn handoff<T>() -> (Inlet<T>, Outlet<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        Inlet { tx },
        Outlet {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Reporting side of a fault channel.
///
/// Stages built from fallible producers or predicates report their first
/// failure here instead of publishing a value.
#[derive(Debug)]
pub struct FaultTx<E> {
    tx: mpsc::Sender<E>,
}

impl<E> Clone for FaultTx<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> FaultTx<E> {
    /// Reports a failure without waiting.
    ///
    /// Only the first failure is kept; later reports, and reports made after
    /// the receiving side is gone, are dropped. Returns `true` if the fault
    /// was recorded.
    pub fn report(&self, err: E) -> bool {
        self.tx.try_send(err).is_ok()
    }
}

/// Receiving side of a fault channel. Owned by the orchestrator.
#[derive(Debug)]
pub struct FaultRx<E> {
    rx: mpsc::Receiver<E>,
}

impl<E> FaultRx<E> {
    /// Waits for the first reported fault.
    ///
    /// Resolves to `None` once every [`FaultTx`] has been dropped without
    /// reporting.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Returns an already reported fault, if any.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

/// Creates a fault channel that retains the first reported failure.
pub fn fault_channel<E>() -> (FaultTx<E>, FaultRx<E>) {
    let (tx, rx) = mpsc::channel(1);
    (FaultTx { tx }, FaultRx { rx })
}
