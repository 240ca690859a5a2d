//! The per-request replication coordinator.
//!
//! One coordinator is created per call to [`crate::facade::replicate`]. It
//! owns the request's state, drains outcomes from a single inbox, applies
//! the quorum and deadline rules, and replies to the caller at most once —
//! while continuing to drain outcomes afterward so every failure still
//! gets a repair enqueue.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use objrepl_types::{Checksum, FailureCause, Method, NodeId, Outcome, PartitionId};
use tokio::sync::oneshot;
use tracing::debug;

use crate::inbox::OutcomeReceiver;
use crate::metrics::ReplicatorMetrics;
use crate::repair::{RepairEntry, RepairKind, RepairQueue};

/// The final result of a replication request, delivered to the caller's
/// completion callback exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicateOutcome {
    /// Quorum was satisfied.
    Ok {
        /// The method that was replicated.
        method: Method,
        /// The checksum of the ack that completed quorum. All acks for the
        /// same object are assumed equal; the coordinator does not verify
        /// this (see the crate's design notes on checksum agreement).
        checksum: Checksum,
    },
    /// Quorum became unreachable before it was satisfied.
    Error {
        /// Every replica failure observed, most-recent-first.
        errors: Vec<(NodeId, FailureCause)>,
    },
    /// The request's deadline elapsed before either of the above fired.
    Timeout,
}

/// Sending half of the coordinator's single-slot reply channel.
pub type ReplySender = oneshot::Sender<ReplicateOutcome>;

/// Receiving half of the coordinator's single-slot reply channel.
pub type ReplyReceiver = oneshot::Receiver<ReplicateOutcome>;

/// Per-request coordinator state (§3 of the design). Not shared: mutated
/// only by the task running [`run`].
struct State {
    method: Method,
    partition: PartitionId,
    key: Bytes,
    /// Total replicas contacted.
    n: u32,
    /// Write quorum requested for this call.
    w: u32,
    /// Replies still awaited.
    remaining: u32,
    /// Acks still required before quorum is satisfied.
    needed: u32,
    acks: Vec<Checksum>,
    /// Arrival order; reversed on read to produce most-recent-first.
    errors: Vec<(NodeId, FailureCause)>,
    reply: Option<ReplySender>,
}

impl State {
    fn new(method: Method, partition: PartitionId, key: Bytes, n: u32, w: u32, reply: ReplySender) -> Self {
        Self {
            method,
            partition,
            key,
            n,
            w,
            remaining: n,
            needed: w,
            acks: Vec::new(),
            errors: Vec::new(),
            reply: Some(reply),
        }
    }

    fn replied(&self) -> bool {
        self.reply.is_none()
    }

    fn reply_once(&mut self, outcome: ReplicateOutcome) {
        if let Some(tx) = self.reply.take() {
            // The facade may have already given up waiting (timed out on
            // its own bound); a failed send just means no one is
            // listening, which is not this coordinator's problem.
            let _ = tx.send(outcome);
        }
    }

    fn errors_most_recent_first(&self) -> Vec<(NodeId, FailureCause)> {
        self.errors.iter().rev().cloned().collect()
    }

    /// Applies one outcome to the state and enqueues repair for failures.
    async fn apply(
        &mut self,
        outcome: Outcome,
        repair_queue: &Arc<dyn RepairQueue>,
        metrics: &ReplicatorMetrics,
    ) {
        match outcome {
            Outcome::Ack { checksum, .. } => {
                self.acks.push(checksum);
                self.remaining = self.remaining.saturating_sub(1);
                self.needed = self.needed.saturating_sub(1);
            }
            Outcome::Fail { node, cause } => {
                repair_queue
                    .enqueue(RepairEntry {
                        kind: RepairKind::from(self.method),
                        partition: self.partition,
                        key: self.key.clone(),
                    })
                    .await;
                metrics.record_repair_enqueued();
                self.errors.push((node, cause));
                self.remaining = self.remaining.saturating_sub(1);
            }
        }

        self.evaluate();
    }

    /// Evaluates the quorum/drain transitions in the precedence order the
    /// design specifies: quorum-failure, then quorum-success, then drain.
    fn evaluate(&mut self) {
        if self.replied() {
            return;
        }

        // Quorum-failure: success has become impossible. Equivalent to
        // `remaining < needed` (not enough outcomes left to ever collect
        // `needed` more acks); expressed here as `errors > N - W`, which
        // holds independent of how many acks have already landed.
        if self.errors.len() as u32 > self.n.saturating_sub(self.w) {
            self.reply_once(ReplicateOutcome::Error {
                errors: self.errors_most_recent_first(),
            });
            return;
        }

        // Quorum-success: enough acks have landed.
        if self.needed == 0 {
            if let Some(checksum) = self.acks.first().cloned() {
                self.reply_once(ReplicateOutcome::Ok {
                    method: self.method,
                    checksum,
                });
            }
            return;
        }

        // Drain: every outcome is in, but neither transition above fired.
        // This is the `W > N` degenerate case (§7): quorum can never be
        // completed even though every reply came back, possibly with some
        // acks among them, so `needed == 0` (not merely "some ack arrived")
        // is the bar for replying `Ok` here, matching the quorum-success
        // branch above.
        if self.remaining == 0 {
            if self.needed == 0 {
                if let Some(checksum) = self.acks.first().cloned() {
                    self.reply_once(ReplicateOutcome::Ok {
                        method: self.method,
                        checksum,
                    });
                    return;
                }
            }
            self.reply_once(ReplicateOutcome::Error {
                errors: self.errors_most_recent_first(),
            });
        }
    }
}

/// Runs one replication request to completion.
///
/// Spawned by the facade as its own task; owns `inbox` and `reply` for the
/// lifetime of the request. Terminates once the caller has been replied to
/// and every one of the `n` expected outcomes has been drained, or once
/// `req_timeout` elapses while no reply has been sent — whichever comes
/// first.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    method: Method,
    partition: PartitionId,
    key: Bytes,
    n: u32,
    w: u32,
    mut inbox: OutcomeReceiver,
    reply: ReplySender,
    repair_queue: Arc<dyn RepairQueue>,
    metrics: Arc<ReplicatorMetrics>,
    req_timeout: Duration,
) {
    let mut state = State::new(method, partition, key, n, w, reply);

    debug!(
        method = %state.method,
        partition = state.partition,
        n,
        w,
        "replication request started"
    );

    // N = 0 (or any other configuration that is already decided) must not
    // block forever on an inbox nobody will ever write to.
    state.evaluate();

    let deadline = tokio::time::Instant::now() + req_timeout;
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    while state.remaining > 0 {
        tokio::select! {
            biased;

            maybe_outcome = inbox.recv() => {
                match maybe_outcome {
                    Some(outcome) => state.apply(outcome, &repair_queue, &metrics).await,
                    // Every endpoint is contracted to post exactly one
                    // outcome; all senders dropping early would mean an
                    // endpoint panicked. Stop waiting rather than hang.
                    None => break,
                }
            }

            () = &mut sleep, if !state.replied() => {
                debug!(
                    method = %state.method,
                    partition = state.partition,
                    acks = state.acks.len(),
                    errors = state.errors.len(),
                    "replication request timed out"
                );
                state.reply_once(ReplicateOutcome::Timeout);
            }
        }
    }

    debug!(
        method = %state.method,
        partition = state.partition,
        acks = state.acks.len(),
        errors = state.errors.len(),
        "replication request finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::InMemoryRepairQueue;

    fn dyn_queue(queue: &Arc<InMemoryRepairQueue>) -> Arc<dyn RepairQueue> {
        Arc::clone(queue) as Arc<dyn RepairQueue>
    }

    fn metrics() -> Arc<ReplicatorMetrics> {
        Arc::new(ReplicatorMetrics::new())
    }

    #[tokio::test]
    async fn all_acks_reach_quorum_and_stop() {
        let (tx, rx) = crate::inbox::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let queue = InMemoryRepairQueue::new();

        tx.send(Outcome::Ack {
            node: 1,
            checksum: Bytes::from_static(b"cA"),
        })
        .expect("send");
        tx.send(Outcome::Ack {
            node: 2,
            checksum: Bytes::from_static(b"cB"),
        })
        .expect("send");
        tx.send(Outcome::Ack {
            node: 3,
            checksum: Bytes::from_static(b"cC"),
        })
        .expect("send");
        drop(tx);

        run(
            Method::Put,
            1,
            Bytes::from_static(b"key"),
            3,
            2,
            rx,
            reply_tx,
            dyn_queue(&queue),
            metrics(),
            Duration::from_secs(5),
        )
        .await;

        let outcome = reply_rx.await.expect("reply sent");
        assert!(matches!(outcome, ReplicateOutcome::Ok { method: Method::Put, .. }));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn enough_failures_trip_quorum_failure_and_keep_draining() {
        let (tx, rx) = crate::inbox::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let queue = InMemoryRepairQueue::new();

        tx.send(Outcome::Fail {
            node: 2,
            cause: FailureCause::nodedown(),
        })
        .expect("send");
        tx.send(Outcome::Fail {
            node: 3,
            cause: FailureCause::new("disk_full"),
        })
        .expect("send");
        tx.send(Outcome::Ack {
            node: 1,
            checksum: Bytes::from_static(b"cA"),
        })
        .expect("send");
        drop(tx);

        run(
            Method::Put,
            1,
            Bytes::from_static(b"key"),
            3,
            2,
            rx,
            reply_tx,
            dyn_queue(&queue),
            metrics(),
            Duration::from_secs(5),
        )
        .await;

        let outcome = reply_rx.await.expect("reply sent");
        match outcome {
            ReplicateOutcome::Error { errors } => {
                assert_eq!(errors.len(), 2);
                // Most-recent-first.
                assert_eq!(errors[0].0, 3);
                assert_eq!(errors[1].0, 2);
            }
            other => panic!("expected quorum failure, got {other:?}"),
        }
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn timeout_fires_when_nothing_else_does() {
        let (_tx, rx) = crate::inbox::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let queue = InMemoryRepairQueue::new();

        // Keep the sender alive so `recv()` doesn't return `None`
        // immediately, but never send anything: this models replicas that
        // never reply before the deadline.
        run(
            Method::Put,
            1,
            Bytes::from_static(b"key"),
            3,
            2,
            rx,
            reply_tx,
            dyn_queue(&queue),
            metrics(),
            Duration::from_millis(20),
        )
        .await;

        let outcome = reply_rx.await.expect("reply sent");
        assert_eq!(outcome, ReplicateOutcome::Timeout);
    }

    #[tokio::test]
    async fn empty_target_list_fails_immediately_without_blocking() {
        let (tx, rx) = crate::inbox::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let queue = InMemoryRepairQueue::new();
        drop(tx);

        run(
            Method::Put,
            1,
            Bytes::from_static(b"key"),
            0,
            1,
            rx,
            reply_tx,
            dyn_queue(&queue),
            metrics(),
            Duration::from_secs(5),
        )
        .await;

        let outcome = reply_rx.await.expect("reply sent");
        assert_eq!(outcome, ReplicateOutcome::Error { errors: Vec::new() });
    }
}
