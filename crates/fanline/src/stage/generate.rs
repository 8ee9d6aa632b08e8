use crate::{FaultTx, Outlet, Scope, fault_channel, handoff};
use core::convert::Infallible;

/// Starts a generator task that publishes `producer()` values until
/// cancelled.
///
/// The sequence is unbounded. Generation is paced by the consumers: a new
/// value is computed only once the previous one has been handed off. The
/// output closes when the scope is cancelled or when every consumer of the
/// returned [`Outlet`] is gone.
pub fn generate<T, P>(scope: &Scope, mut producer: P) -> Outlet<T>
where
    T: Send + 'static,
    P: FnMut() -> T + Send + 'static,
{
    // Infallible producers never report, so the receiving side is not kept.
    let (faults, _) = fault_channel::<Infallible>();
    try_generate(scope, faults, move || Ok(producer()))
}

/// Fallible variant of [`generate`].
///
/// On the first `Err` the error is reported on `faults`, the output closes,
/// and the task returns. No value is published for a failed call.
pub fn try_generate<T, E, P>(scope: &Scope, faults: FaultTx<E>, mut producer: P) -> Outlet<T>
where
    T: Send + 'static,
    E: Send + 'static,
    P: FnMut() -> Result<T, E> + Send + 'static,
{
    let (inlet, outlet) = handoff();
    let listener = scope.listener().clone();
    let stats = scope.shared_stats();

    let fut = async move {
        #[cfg(feature = "tracing")]
        tracing::trace!("Generator started");

        while !listener.is_cancelled() {
            let value = match producer() {
                Ok(value) => value,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Producer failed, closing generator stream");
                    faults.report(err);
                    break;
                }
            };

            tokio::select! {
                biased;
                () = listener.cancelled() => break,
                res = inlet.send(value) => {
                    if res.is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Generator has no consumers left");
                        break;
                    }
                    stats.record_generated();
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Generator stopped");
    };

    #[cfg(feature = "tracing")]
    let fut = {
        use tracing::Instrument;
        fut.instrument(tracing::debug_span!("generator"))
    };

    scope.spawn(fut);
    outlet
}
