use crate::{FaultTx, Outlet, Scope, fault_channel, handoff};
use core::convert::Infallible;

/// Starts a worker task that republishes the values of `input` satisfying
/// `predicate`.
///
/// Any number of workers may be started on clones of the same `input`; each
/// value is then delivered to exactly one of them, which distributes the load
/// without an explicit scheduler. The output closes when `input` reaches
/// end-of-stream, when the scope is cancelled, or when every consumer of the
/// output is gone.
pub fn filter<T, F>(scope: &Scope, input: Outlet<T>, predicate: F) -> Outlet<T>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + 'static,
{
    let (faults, _) = fault_channel::<Infallible>();
    try_filter(scope, faults, input, move |value: &T| Ok(predicate(value)))
}

/// Fallible variant of [`filter`].
///
/// When `predicate` fails, the value is counted as rejected, the error is
/// reported on `faults`, and the worker closes its output and returns.
pub fn try_filter<T, E, F>(
    scope: &Scope,
    faults: FaultTx<E>,
    input: Outlet<T>,
    predicate: F,
) -> Outlet<T>
where
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(&T) -> Result<bool, E> + Send + 'static,
{
    let (output, outlet) = handoff();
    let listener = scope.listener().clone();
    let stats = scope.shared_stats();

    let fut = async move {
        #[cfg(feature = "tracing")]
        tracing::trace!("Worker started");

        loop {
            let value = tokio::select! {
                biased;
                () = listener.cancelled() => break,
                next = input.recv() => match next {
                    Some(value) => value,
                    None => break,
                },
            };
            stats.record_received();

            let keep = match predicate(&value) {
                Ok(keep) => keep,
                Err(err) => {
                    stats.record_verdict(false);
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Predicate failed, closing worker stream");
                    faults.report(err);
                    break;
                }
            };
            stats.record_verdict(keep);
            if !keep {
                continue;
            }

            tokio::select! {
                biased;
                () = listener.cancelled() => break,
                res = output.send(value) => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Worker stopped");
    };

    #[cfg(feature = "tracing")]
    let fut = {
        use tracing::Instrument;
        fut.instrument(tracing::debug_span!("filter"))
    };

    scope.spawn(fut);
    outlet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{
        generate,
        testing::{self, DEADLINE},
    };

    #[tokio::test]
    async fn keeps_matching_values_in_input_order() {
        let (_signal, scope) = testing::scope();
        let input = testing::source(&scope, vec![4, 4, 6, 7, 9, 11, 12, 13]);
        let output = filter(&scope, input, |n: &u32| n % 2 == 1);

        assert_eq!(testing::drain(output).await, vec![7, 9, 11, 13]);
        testing::quiesce(&scope).await;

        let stats = scope.stats().snapshot();
        assert_eq!(stats.received, 8);
        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.rejected, 4);
    }

    #[tokio::test]
    async fn closes_when_input_closes() {
        let (_signal, scope) = testing::scope();
        let input = testing::source(&scope, Vec::<u8>::new());
        let output = filter(&scope, input, |_| true);
        assert!(testing::drain(output).await.is_empty());
        testing::quiesce(&scope).await;
    }

    #[tokio::test]
    async fn stops_on_cancel_while_rejecting() {
        let (signal, scope) = testing::scope();
        // A predicate that never accepts keeps the worker busy receiving.
        let input = generate(&scope, || 0_u8);
        let output = filter(&scope, input, |_| false);

        tokio::task::yield_now().await;
        signal.fire();
        assert!(testing::drain(output).await.is_empty());
        testing::quiesce(&scope).await;
        assert!(scope.stats().snapshot().is_conserved());
    }

    #[tokio::test]
    async fn does_not_block_on_send_after_cancel() {
        let (signal, scope) = testing::scope();
        let input = generate(&scope, || 1_u8);
        // Nobody reads the output, so the worker parks on its second send.
        let _output = filter(&scope, input, |_| true);

        tokio::time::sleep(core::time::Duration::from_millis(10)).await;
        signal.fire();
        tokio::time::timeout(DEADLINE, scope.quiesce()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn competing_workers_split_the_input() {
        let (_signal, scope) = testing::scope();
        let input = testing::source(&scope, (0..200_u32).collect());
        let outputs: Vec<_> = (0..4)
            .map(|_| filter(&scope, input.clone(), |_| true))
            .collect();
        drop(input);

        let mut all = Vec::new();
        for output in outputs {
            all.extend(testing::drain(output).await);
        }
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn reports_predicate_failure_and_closes() {
        let (_signal, scope) = testing::scope();
        let (faults, mut fault_rx) = fault_channel();
        let input = testing::source(&scope, vec![1, 2, 3, 4]);
        let output = try_filter(&scope, faults, input, |n: &i32| {
            if *n == 3 { Err(format!("bad value {n}")) } else { Ok(true) }
        });

        assert_eq!(testing::drain(output).await, vec![1, 2]);
        assert_eq!(fault_rx.recv().await.as_deref(), Some("bad value 3"));
        testing::quiesce(&scope).await;

        let stats = scope.stats().snapshot();
        assert_eq!(stats.received, 3);
        assert!(stats.is_conserved());
    }
}
