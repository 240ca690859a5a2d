//! Replica endpoints: the per-target tasks that actually carry out a write
//! and post exactly one [`Outcome`] to the coordinator's inbox.

use std::sync::Arc;

use objrepl_types::{FailureCause, Method, NodeId, Outcome, ReplicateObject};
use tracing::warn;
use uuid::Uuid;

use crate::inbox::OutcomeSender;
use crate::store::ObjectStore;
use crate::transport::RemoteTransport;

/// Runs the write against the local object store and posts the result.
///
/// This is the endpoint selected when a target is the current node and is
/// reachable; it never issues an RPC.
pub async fn run_local(
    local_node: NodeId,
    method: Method,
    object: Arc<ReplicateObject>,
    store: Arc<dyn ObjectStore>,
    inbox: OutcomeSender,
) {
    let token = Uuid::new_v4();

    let result = match method {
        Method::Put => store.put(&object, token).await,
        Method::Delete => store.delete(&object, token).await,
    };

    let outcome = match result {
        Ok(checksum) => Outcome::Ack {
            node: local_node,
            checksum,
        },
        Err(cause) => {
            warn!(
                key = ?object.key,
                node = local_node,
                req_id = object.req_id,
                %cause,
                "local replica rejected write"
            );
            Outcome::Fail {
                node: local_node,
                cause: FailureCause::new(cause.to_string()),
            }
        }
    };

    // The coordinator may have already terminated; a dropped-receiver send
    // error is not this endpoint's concern.
    let _ = inbox.send(outcome);
}

/// Casts the write to a remote node and returns immediately. The outcome
/// arrives later, posted directly by the transport to `inbox`.
pub async fn run_remote(
    target: NodeId,
    method: Method,
    object: Arc<ReplicateObject>,
    req_id: u64,
    transport: Arc<dyn RemoteTransport>,
    inbox: OutcomeSender,
) {
    match method {
        Method::Put => transport.cast_put(target, inbox, object, req_id).await,
        Method::Delete => transport.cast_delete(target, inbox, object, req_id).await,
    }
}

/// Synthesizes the outcome for a target the redundancy map already
/// reported as unreachable, without issuing any RPC.
pub fn unreachable_outcome(target: NodeId) -> Outcome {
    Outcome::Fail {
        node: target,
        cause: FailureCause::nodedown(),
    }
}
