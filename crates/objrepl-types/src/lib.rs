//! Shared data model for the object replication coordinator.
//!
//! These types cross the boundary between the coordinator and its external
//! collaborators (the local object store, the remote RPC transport, the
//! redundancy map, and the repair queue). None of them carry behavior of
//! their own; the coordinator crate owns the state machine that interprets
//! them.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identity of a node in the cluster, as used by the redundancy map.
pub type NodeId = u64;

/// Identifier of an object's placement group, used as the repair-queue
/// routing key.
pub type PartitionId = u64;

/// Opaque content hash returned by the local object store on a successful
/// write. Echoed back to the caller as the success payload.
pub type Checksum = Bytes;

/// Which local-store operation a replication request performs.
///
/// Echoed back to the caller in the success reply so it can tell a
/// replicated `Put` from a replicated `Delete` without re-threading the
/// original request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Write (or overwrite) the object.
    Put,
    /// Remove the object (represented as a tombstone write at the store
    /// layer; the coordinator does not distinguish delete from put beyond
    /// this tag and the repair-kind it enqueues on failure).
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A single node designated to hold a copy of an object, together with
/// whether the redundancy map currently considers it reachable.
///
/// Order is not semantically significant but is preserved by the
/// coordinator for deterministic testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaTarget {
    /// The target node's identity.
    pub node: NodeId,
    /// Whether the redundancy map currently considers this node reachable.
    pub reachable: bool,
}

impl ReplicaTarget {
    /// Creates a reachable target.
    #[must_use]
    pub const fn reachable(node: NodeId) -> Self {
        Self {
            node,
            reachable: true,
        }
    }

    /// Creates an unreachable target.
    #[must_use]
    pub const fn unreachable(node: NodeId) -> Self {
        Self {
            node,
            reachable: false,
        }
    }
}

/// The immutable payload handed to a replication request.
///
/// Cheap to clone: the key and the bytes are reference-counted via
/// [`Bytes`], so fanning the same object out to N endpoints does not copy
/// the payload N times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateObject {
    /// Partition (placement group) identifier, used as the repair-queue
    /// routing key.
    pub partition: PartitionId,
    /// Opaque object key.
    pub key: Bytes,
    /// Caller-supplied request identifier, used for logging and RPC
    /// correlation.
    pub req_id: u64,
    /// Opaque payload bytes/metadata.
    pub payload: Bytes,
}

/// An opaque diagnostic describing why a replica rejected a write or could
/// not be reached. The coordinator never inspects the contents; it only
/// forwards the cause to the caller and the repair queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause(String);

impl FailureCause {
    /// Wraps an arbitrary diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The cause synthesized by the coordinator for a target the
    /// redundancy map reported as unreachable, without issuing an RPC.
    #[must_use]
    pub fn nodedown() -> Self {
        Self::new("nodedown")
    }

    /// Borrows the diagnostic message.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FailureCause {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FailureCause {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The result of a single replica's attempt to apply a write.
///
/// Every endpoint (local or remote) produces exactly one `Outcome` per
/// target and posts it to the coordinator's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The replica accepted the write.
    Ack {
        /// The node that acknowledged.
        node: NodeId,
        /// The store-returned content hash.
        checksum: Checksum,
    },
    /// The replica rejected the write, or was never reachable.
    Fail {
        /// The node that failed (or was skipped as unreachable).
        node: NodeId,
        /// Opaque diagnostic.
        cause: FailureCause,
    },
}

impl Outcome {
    /// The node this outcome concerns, regardless of variant.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        match self {
            Self::Ack { node, .. } | Self::Fail { node, .. } => *node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Put.to_string(), "put");
        assert_eq!(Method::Delete.to_string(), "delete");
    }

    #[test]
    fn replica_target_constructors() {
        let a = ReplicaTarget::reachable(1);
        let b = ReplicaTarget::unreachable(2);
        assert!(a.reachable);
        assert!(!b.reachable);
    }

    #[test]
    fn failure_cause_nodedown() {
        assert_eq!(FailureCause::nodedown().as_str(), "nodedown");
    }

    #[test]
    fn outcome_node_accessor() {
        let ack = Outcome::Ack {
            node: 7,
            checksum: Bytes::from_static(b"abc"),
        };
        let fail = Outcome::Fail {
            node: 9,
            cause: FailureCause::nodedown(),
        };
        assert_eq!(ack.node(), 7);
        assert_eq!(fail.node(), 9);
    }
}
