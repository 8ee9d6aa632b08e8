use crate::{Outlet, Scope, handoff};

/// Merges any number of streams into one.
///
/// One forwarding task is started per source. Each reads its source until
/// end-of-stream or cancellation and republishes every value onto the shared
/// output. The forwarders hold the only producer handles of the output, so
/// the merged stream closes exactly once: when the last forwarder returns.
/// Consumers therefore never see end-of-stream while a source is still live.
///
/// Values of one source keep their relative order; there is no ordering
/// across sources. Merging zero sources yields a stream that is already
/// closed.
pub fn merge<T, I>(scope: &Scope, sources: I) -> Outlet<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Outlet<T>>,
{
    let (output, outlet) = handoff();

    for (_source_id, source) in sources.into_iter().enumerate() {
        let output = output.clone();
        let listener = scope.listener().clone();
        let stats = scope.shared_stats();

        let fut = async move {
            loop {
                let value = tokio::select! {
                    biased;
                    () = listener.cancelled() => break,
                    next = source.recv() => match next {
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
                        stats.record_merged();
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!("Merge source {_source_id} drained");
        };

        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(tracing::debug_span!("merge_source", id = _source_id))
        };

        scope.spawn(fut);
    }

    outlet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{generate, testing};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn zero_sources_close_immediately() {
        let (_signal, scope) = testing::scope();
        let merged = merge::<u8, _>(&scope, Vec::new());
        assert!(testing::drain(merged).await.is_empty());
        assert_eq!(scope.pending_tasks(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delivers_every_source_value() {
        let (_signal, scope) = testing::scope();
        let sources: Vec<_> = (0..5_u32)
            .map(|s| testing::source(&scope, (0..50).map(|i| s * 1_000 + i).collect()))
            .collect();

        let merged = testing::drain(merge(&scope, sources)).await;
        testing::quiesce(&scope).await;

        assert_eq!(merged.len(), 250);
        assert_eq!(scope.stats().snapshot().merged, 250);

        // Per-source order survives the merge.
        let mut by_source: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for v in merged {
            by_source.entry(v / 1_000).or_default().push(v % 1_000);
        }
        assert_eq!(by_source.len(), 5);
        for values in by_source.values() {
            assert_eq!(values, &(0..50).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn stays_open_while_a_source_is_live() {
        let (signal, scope) = testing::scope();
        let finite = testing::source(&scope, vec![1_u8, 2]);
        let endless = generate(&scope, || 9_u8);
        let merged = merge(&scope, vec![finite, endless]);

        // The finite source closes early; the merged stream must keep going.
        for _ in 0..20 {
            assert!(merged.recv().await.is_some());
        }

        signal.fire();
        testing::drain(merged).await;
        testing::quiesce(&scope).await;
    }

    #[tokio::test]
    async fn forwarders_exit_on_cancel_with_blocked_sends() {
        let (signal, scope) = testing::scope();
        let sources: Vec<_> = (0..3).map(|_| generate(&scope, || 0_u16)).collect();
        let _merged = merge(&scope, sources);

        tokio::task::yield_now().await;
        signal.fire();
        testing::quiesce(&scope).await;
    }
}
