//! The replicator facade: the synchronous entry point callers use to
//! replicate a single object.
//!
//! `Replicator::replicate` fans a write out to every target, builds a fresh
//! [`crate::coordinator`] to own the request, and invokes the caller's
//! completion callback exactly once with the final [`ReplicateOutcome`].
//! The call is synchronous with respect to `on_complete` but does not block
//! the caller's progress beyond the configured request timeout.

use std::sync::Arc;

use objrepl_types::{Method, NodeId, Outcome, ReplicateObject, ReplicaTarget};
use tracing::warn;

use crate::config::ReplicatorConfig;
use crate::coordinator::{self, ReplicateOutcome};
use crate::endpoint;
use crate::inbox;
use crate::metrics::ReplicatorMetrics;
use crate::repair::RepairQueue;
use crate::store::ObjectStore;
use crate::transport::RemoteTransport;

/// Builds and dispatches per-request replication coordinators.
///
/// One `Replicator` is constructed per storage node and reused across every
/// replication request it handles; each call to [`Self::replicate`] spawns
/// its own short-lived coordinator and endpoint tasks.
#[derive(Clone)]
pub struct Replicator {
    local_node: NodeId,
    config: ReplicatorConfig,
    store: Arc<dyn ObjectStore>,
    transport: Arc<dyn RemoteTransport>,
    repair_queue: Arc<dyn RepairQueue>,
    metrics: Arc<ReplicatorMetrics>,
}

impl std::fmt::Debug for Replicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replicator")
            .field("local_node", &self.local_node)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Replicator {
    /// Builds a facade bound to `local_node`'s object store, remote
    /// transport, and repair queue.
    #[must_use]
    pub fn new(
        local_node: NodeId,
        config: ReplicatorConfig,
        store: Arc<dyn ObjectStore>,
        transport: Arc<dyn RemoteTransport>,
        repair_queue: Arc<dyn RepairQueue>,
    ) -> Self {
        Self {
            local_node,
            config,
            store,
            transport,
            repair_queue,
            metrics: Arc::new(ReplicatorMetrics::new()),
        }
    }

    /// Returns a snapshot of the process-wide replication counters.
    #[must_use]
    pub fn metrics(&self) -> crate::metrics::MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Replicates `object` to `targets`, requiring `w` acknowledgements,
    /// and invokes `on_complete` exactly once with the final outcome.
    ///
    /// `targets` order is preserved for dispatch but carries no semantic
    /// weight; `w` may legitimately exceed `targets.len()` (quorum becomes
    /// unreachable) or be zero (quorum is satisfied by the first ack).
    pub async fn replicate<F>(
        &self,
        method: Method,
        w: u32,
        targets: Vec<ReplicaTarget>,
        object: ReplicateObject,
        on_complete: F,
    ) where
        F: FnOnce(ReplicateOutcome) + Send + 'static,
    {
        self.metrics.record_started();

        #[allow(clippy::cast_possible_truncation)]
        let n = targets.len() as u32;
        let object = Arc::new(object);
        let (tx, rx) = inbox::channel();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

        for target in targets {
            self.dispatch(method, &object, target, tx.clone());
        }
        drop(tx);

        let coordinator_handle = tokio::spawn(coordinator::run(
            method,
            object.partition,
            object.key.clone(),
            n,
            w,
            rx,
            reply_tx,
            Arc::clone(&self.repair_queue),
            Arc::clone(&self.metrics),
            self.config.req_timeout,
        ));

        // The coordinator enforces `req_timeout` internally and always
        // replies by then; this outer bound only guards against the
        // coordinator task itself never having run (e.g. the runtime is
        // shedding load), so a generous margin is deliberate rather than a
        // second deadline callers need to reason about.
        let outer_bound = self.config.req_timeout + std::time::Duration::from_secs(1);
        let outcome = match tokio::time::timeout(outer_bound, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                warn!(
                    partition = object.partition,
                    req_id = object.req_id,
                    "replication coordinator dropped its reply sender without answering"
                );
                ReplicateOutcome::Timeout
            }
            Err(_) => {
                warn!(
                    partition = object.partition,
                    req_id = object.req_id,
                    "replicator facade gave up waiting on the coordinator"
                );
                ReplicateOutcome::Timeout
            }
        };

        match &outcome {
            ReplicateOutcome::Ok { .. } => self.metrics.record_succeeded(),
            ReplicateOutcome::Error { .. } => self.metrics.record_failed(),
            ReplicateOutcome::Timeout => self.metrics.record_timed_out(),
        }

        // Detached deliberately: the coordinator keeps draining outcomes
        // after replying so every failure still gets a repair enqueue, and
        // the facade has already delivered its answer to the caller.
        drop(coordinator_handle);

        on_complete(outcome);
    }

    fn dispatch(
        &self,
        method: Method,
        object: &Arc<ReplicateObject>,
        target: ReplicaTarget,
        inbox: inbox::OutcomeSender,
    ) {
        if !target.reachable {
            let _ = inbox.send(endpoint::unreachable_outcome(target.node));
            return;
        }

        if target.node == self.local_node {
            tokio::spawn(endpoint::run_local(
                self.local_node,
                method,
                Arc::clone(object),
                Arc::clone(&self.store),
                inbox,
            ));
        } else {
            tokio::spawn(endpoint::run_remote(
                target.node,
                method,
                Arc::clone(object),
                object.req_id,
                Arc::clone(&self.transport),
                inbox,
            ));
        }
    }
}

/// Synthesizes [`Outcome`]s for every target without dispatching any
/// endpoint, for callers that want to validate a target list before
/// committing to a full [`Replicator::replicate`] call.
#[must_use]
pub fn unreachable_outcomes(targets: &[ReplicaTarget]) -> Vec<Outcome> {
    targets
        .iter()
        .filter(|target| !target.reachable)
        .map(|target| endpoint::unreachable_outcome(target.node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::InMemoryRepairQueue;
    use crate::store::ScriptedStore;
    use crate::transport::{ScriptedReply, ScriptedTransport};
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn object() -> ReplicateObject {
        ReplicateObject {
            partition: 1,
            key: Bytes::from_static(b"key"),
            req_id: 42,
            payload: Bytes::from_static(b"payload"),
        }
    }

    fn replicator(req_timeout: Duration, store: ScriptedStore, transport: Arc<ScriptedTransport>) -> Replicator {
        Replicator::new(
            1,
            ReplicatorConfig::builder()
                .req_timeout(req_timeout)
                .build()
                .expect("valid config"),
            Arc::new(store),
            transport,
            InMemoryRepairQueue::new(),
        )
    }

    #[tokio::test]
    async fn all_success_returns_one_of_the_collected_checksums() {
        let transport = ScriptedTransport::new();
        transport
            .script(2, ScriptedReply::Ack(Bytes::from_static(b"cB")), Duration::ZERO)
            .await;
        transport
            .script(3, ScriptedReply::Ack(Bytes::from_static(b"cC")), Duration::ZERO)
            .await;

        let replicator = replicator(
            Duration::from_secs(5),
            ScriptedStore::ok(Bytes::from_static(b"cA")),
            transport,
        );

        let targets = vec![
            ReplicaTarget::reachable(1),
            ReplicaTarget::reachable(2),
            ReplicaTarget::reachable(3),
        ];

        let (tx, rx) = oneshot::channel();
        replicator
            .replicate(Method::Put, 2, targets, object(), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await;

        let outcome = rx.await.expect("callback invoked");
        match outcome {
            ReplicateOutcome::Ok { method, checksum } => {
                assert_eq!(method, Method::Put);
                assert!([
                    Bytes::from_static(b"cA"),
                    Bytes::from_static(b"cB"),
                    Bytes::from_static(b"cC")
                ]
                .contains(&checksum));
            }
            other => panic!("expected quorum success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_target_fails_without_issuing_rpc() {
        let transport = ScriptedTransport::new();
        let replicator = replicator(
            Duration::from_secs(5),
            ScriptedStore::failing("unused"),
            transport,
        );

        let targets = vec![
            ReplicaTarget::unreachable(1),
            ReplicaTarget::unreachable(2),
            ReplicaTarget::unreachable(3),
        ];

        let (tx, rx) = oneshot::channel();
        replicator
            .replicate(Method::Put, 1, targets, object(), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await;

        let outcome = rx.await.expect("callback invoked");
        match outcome {
            ReplicateOutcome::Error { errors } => assert_eq!(errors.len(), 3),
            other => panic!("expected quorum failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_replicas_trip_the_timeout() {
        let transport = ScriptedTransport::new();
        transport
            .script(
                2,
                ScriptedReply::Ack(Bytes::from_static(b"cB")),
                Duration::from_secs(60),
            )
            .await;
        transport
            .script(
                3,
                ScriptedReply::Ack(Bytes::from_static(b"cC")),
                Duration::from_secs(60),
            )
            .await;

        let replicator = replicator(
            Duration::from_millis(20),
            ScriptedStore::ok(Bytes::from_static(b"cA")),
            transport,
        );

        let targets = vec![
            ReplicaTarget::reachable(1),
            ReplicaTarget::reachable(2),
            ReplicaTarget::reachable(3),
        ];

        let (tx, rx) = oneshot::channel();
        replicator
            .replicate(Method::Put, 2, targets, object(), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await;

        let outcome = rx.await.expect("callback invoked");
        assert_eq!(outcome, ReplicateOutcome::Timeout);
    }

    #[tokio::test]
    async fn empty_target_list_fails_immediately() {
        let transport = ScriptedTransport::new();
        let replicator = replicator(
            Duration::from_secs(5),
            ScriptedStore::failing("unused"),
            transport,
        );

        let (tx, rx) = oneshot::channel();
        replicator
            .replicate(Method::Put, 1, Vec::new(), object(), move |outcome| {
                let _ = tx.send(outcome);
            })
            .await;

        let outcome = rx.await.expect("callback invoked");
        assert_eq!(outcome, ReplicateOutcome::Error { errors: Vec::new() });
    }

    #[test]
    fn unreachable_outcomes_skips_reachable_targets() {
        let targets = vec![ReplicaTarget::reachable(1), ReplicaTarget::unreachable(2)];
        let outcomes = unreachable_outcomes(&targets);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].node(), 2);
    }
}
