//! Remote RPC transport contract: ships a write to another node.
//!
//! The call is a one-way cast. The transport is expected to eventually
//! deliver exactly one [`Outcome`] to the coordinator's inbox, on the
//! remote node's own time, regardless of whether the coordinator is still
//! listening. The local call itself must not block on the remote write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use objrepl_types::{Checksum, FailureCause, NodeId, ReplicateObject};
use tokio::sync::Mutex;

use crate::inbox::OutcomeSender;

/// Opaque transport-level failure, surfaced as a [`FailureCause`] rather
/// than propagated as a Rust error: by the time a caller could observe it,
/// the outcome has already been posted to the coordinator's inbox as
/// `Outcome::Fail`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    /// Wraps an arbitrary transport-level diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Ships a write to another node's object handler.
///
/// Implementations must not await the remote write before returning: the
/// RPC is a cast, and the eventual `Ack`/`Fail` is delivered to `inbox`
/// out-of-band, not as this call's return value.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Casts a `put` to `target`, handing it the coordinator's inbox so it
    /// can post its outcome directly.
    async fn cast_put(
        &self,
        target: NodeId,
        inbox: OutcomeSender,
        object: Arc<ReplicateObject>,
        req_id: u64,
    );

    /// Casts a `delete` to `target`, handing it the coordinator's inbox so
    /// it can post its outcome directly.
    async fn cast_delete(
        &self,
        target: NodeId,
        inbox: OutcomeSender,
        object: Arc<ReplicateObject>,
        req_id: u64,
    );
}

/// A scripted reply a [`ScriptedTransport`] will eventually post for a
/// given node.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// The remote replica acknowledges with this checksum.
    Ack(Checksum),
    /// The remote replica rejects the write with this cause.
    Fail(FailureCause),
}

/// A scriptable, in-memory [`RemoteTransport`] for tests.
///
/// Each node can be scripted with a reply and a delay before that reply is
/// posted to the inbox. Nodes with no script respond immediately with a
/// failure, rather than hanging, so an incompletely scripted test fails
/// fast instead of timing out mysteriously. To model a replica that never
/// responds within the test's deadline, script a delay longer than the
/// `req_timeout` under test.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<NodeId, (ScriptedReply, Duration)>>,
}

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Scripts the reply `node` will eventually receive, after `delay`.
    pub async fn script(&self, node: NodeId, reply: ScriptedReply, delay: Duration) {
        self.scripts.lock().await.insert(node, (reply, delay));
    }

    async fn scripted_reply(&self, node: NodeId) -> (ScriptedReply, Duration) {
        self.scripts.lock().await.get(&node).cloned().map_or_else(
            || {
                (
                    ScriptedReply::Fail(FailureCause::new("unscripted node")),
                    Duration::ZERO,
                )
            },
            |scripted| scripted,
        )
    }

    async fn cast(&self, target: NodeId, inbox: OutcomeSender) {
        let (reply, delay) = self.scripted_reply(target).await;
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = match reply {
                ScriptedReply::Ack(checksum) => objrepl_types::Outcome::Ack {
                    node: target,
                    checksum,
                },
                ScriptedReply::Fail(cause) => objrepl_types::Outcome::Fail {
                    node: target,
                    cause,
                },
            };
            // The coordinator may already have terminated (e.g. it timed
            // out and was dropped); a dropped-receiver send error is not a
            // transport failure, so it is discarded.
            let _ = inbox.send(outcome);
        });
    }
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn cast_put(
        &self,
        target: NodeId,
        inbox: OutcomeSender,
        _object: Arc<ReplicateObject>,
        _req_id: u64,
    ) {
        self.cast(target, inbox).await;
    }

    async fn cast_delete(
        &self,
        target: NodeId,
        inbox: OutcomeSender,
        _object: Arc<ReplicateObject>,
        _req_id: u64,
    ) {
        self.cast(target, inbox).await;
    }
}
