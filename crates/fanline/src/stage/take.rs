use crate::{Outlet, Scope, handoff};

/// Forwards at most `limit` values of `input` and then closes.
///
/// Each attempt races cancellation against receiving the next value and
/// again against forwarding it. If `input` closes first the output simply
/// ends early; a short result is not an error. A `limit` of zero yields an
/// output that closes without delivering anything.
///
/// Once finished the task drops `input`, so upstream stages that only feed
/// this take see their consumers disappear.
pub fn take<T>(scope: &Scope, input: Outlet<T>, limit: usize) -> Outlet<T>
where
    T: Send + 'static,
{
    let (output, outlet) = handoff();
    let listener = scope.listener().clone();
    let stats = scope.shared_stats();

    let fut = async move {
        for _index in 0..limit {
            let value = tokio::select! {
                biased;
                () = listener.cancelled() => break,
                next = input.recv() => match next {
                    Some(value) => value,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                () = listener.cancelled() => break,
                res = output.send(value) => {
                    if res.is_err() {
                        break;
                    }
                    stats.record_taken();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(index = _index, "Took value from stream");
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Take finished");
    };

    #[cfg(feature = "tracing")]
    let fut = {
        use tracing::Instrument;
        fut.instrument(tracing::debug_span!("take", limit))
    };

    scope.spawn(fut);
    outlet
}
